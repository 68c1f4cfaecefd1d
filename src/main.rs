use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gloo::file::callbacks::FileReader;
use gloo::net::http::Request;
use gloo::timers::callback::Interval;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

use kujibiki_core::{
    decode_snapshot, encode_snapshot, groups_csv, parse_names_text, restore_roster,
    snapshot_roster, DrawError, DrawMode, Group, GroupBoard, Participant, RaffleEngine, Roster,
    SplitMix64, SAMPLE_NAMES, SPIN_TICK_MS,
};

const ROSTER_STORAGE_KEY: &str = "kujibiki.roster.v1";
const TEAM_NAMES_URL: &str = "/api/team-names";
const TEAM_NAMES_THEME: &str = "專業且具創意";
const EMPTY_POOL_NOTICE: &str = "已經沒有剩餘的人選可以抽取了！";
const DEFAULT_GROUP_SIZE: usize = 4;

fn time_seed() -> u64 {
    js_sys::Date::now() as u64
}

fn load_saved_roster() -> Option<Roster> {
    let window = web_sys::window()?;
    let storage = window.local_storage().ok()??;
    let raw = storage.get_item(ROSTER_STORAGE_KEY).ok()??;
    let bytes = STANDARD.decode(raw.as_bytes()).ok()?;
    let snapshot = decode_snapshot(&bytes)?;
    let roster = restore_roster(&snapshot);
    if roster.is_none() {
        gloo::console::log!("roster restore: stale or invalid snapshot");
    }
    roster
}

fn save_roster(roster: &Roster) {
    let Some(storage) = web_sys::window().and_then(|window| window.local_storage().ok().flatten())
    else {
        return;
    };
    let snapshot = snapshot_roster(roster);
    let Some(bytes) = encode_snapshot(&snapshot) else {
        return;
    };
    if storage.set_item(ROSTER_STORAGE_KEY, &STANDARD.encode(&bytes)).is_err() {
        gloo::console::warn!("roster save failed");
    }
}

fn download_text(filename: &str, mime: &str, content: &str) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let parts = js_sys::Array::new();
    parts.push(&JsValue::from_str(content));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    let Ok(blob) = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options) else {
        return;
    };
    let Ok(url) = web_sys::Url::create_object_url_with_blob(&blob) else {
        return;
    };
    let anchor = document
        .create_element("a")
        .ok()
        .and_then(|element| element.dyn_into::<web_sys::HtmlAnchorElement>().ok());
    if let Some(anchor) = anchor {
        anchor.set_href(&url);
        anchor.set_download(filename);
        if let Some(body) = document.body() {
            let _ = body.append_child(&anchor);
            anchor.click();
            anchor.remove();
        }
    }
    let _ = web_sys::Url::revoke_object_url(&url);
}

fn csv_filename() -> String {
    let stamp = String::from(js_sys::Date::new_0().to_iso_string());
    let date = stamp.get(..10).unwrap_or("export").to_string();
    format!("分組結果_{date}.csv")
}

fn clamp_group_size(value: i64, roster_len: usize) -> usize {
    let max = roster_len.max(1) as i64;
    value.clamp(1, max) as usize
}

fn team_names_from_json(text: &str) -> Option<Vec<String>> {
    serde_json::from_str::<Vec<String>>(text.trim()).ok()
}

#[derive(Serialize)]
struct TeamNamesRequest<'a> {
    count: usize,
    theme: &'a str,
}

// Any failure (network, status, parse, shape) collapses to None; callers
// keep default group names.
async fn request_team_names(count: usize, theme: &str) -> Option<Vec<String>> {
    let body = TeamNamesRequest { count, theme };
    let request = match Request::post(TEAM_NAMES_URL).json(&body) {
        Ok(request) => request,
        Err(_) => return None,
    };
    let response = match request.send().await {
        Ok(response) => response,
        Err(_) => {
            gloo::console::warn!("team names: request failed");
            return None;
        }
    };
    if !response.ok() {
        gloo::console::warn!("team names: http status", response.status());
        return None;
    }
    let text = response.text().await.ok()?;
    let names = team_names_from_json(&text);
    if names.is_none() {
        gloo::console::warn!("team names: unexpected payload");
    }
    names
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum View {
    Roster,
    Draw,
    Grouping,
}

#[derive(Properties, PartialEq)]
struct RosterPanelProps {
    roster: Roster,
    on_change: Callback<Roster>,
    on_next: Callback<()>,
}

#[function_component(RosterPanel)]
fn roster_panel(props: &RosterPanelProps) -> Html {
    let text_input = use_state(String::new);
    let readers = use_mut_ref(Vec::<FileReader>::new);

    let counts = props.roster.name_counts();
    let has_duplicates = counts.values().any(|count| *count > 1);

    let on_text_input = {
        let text_input = text_input.clone();
        Callback::from(move |event: InputEvent| {
            if let Some(area) = event.target_dyn_into::<HtmlTextAreaElement>() {
                text_input.set(area.value());
            }
        })
    };

    let on_add_text = {
        let text_input = text_input.clone();
        let roster = props.roster.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |_| {
            let names = parse_names_text(&text_input);
            if names.is_empty() {
                return;
            }
            let mut next = roster.clone();
            next.append_names(&names);
            on_change.emit(next);
            text_input.set(String::new());
        })
    };

    let on_upload = {
        let roster = props.roster.clone();
        let on_change = props.on_change.clone();
        let readers = readers.clone();
        Callback::from(move |event: Event| {
            let Some(input) = event.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let Some(files) = input.files() else {
                return;
            };
            for index in 0..files.length() {
                let Some(file) = files.item(index) else {
                    continue;
                };
                let file = gloo::file::File::from(file);
                let roster = roster.clone();
                let on_change = on_change.clone();
                let reader = gloo::file::callbacks::read_as_text(&file, move |result| {
                    match result {
                        Ok(content) => {
                            let names = parse_names_text(&content);
                            if names.is_empty() {
                                return;
                            }
                            let mut next = roster.clone();
                            next.append_names(&names);
                            on_change.emit(next);
                        }
                        Err(_) => gloo::console::warn!("roster upload: unreadable file"),
                    }
                });
                readers.borrow_mut().push(reader);
            }
            input.set_value("");
        })
    };

    let on_sample = {
        let roster = props.roster.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |_| {
            let mut next = roster.clone();
            next.append_names(SAMPLE_NAMES.iter().copied());
            on_change.emit(next);
        })
    };

    let on_dedupe = {
        let roster = props.roster.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |_| {
            let mut next = roster.clone();
            next.dedupe_by_name();
            on_change.emit(next);
        })
    };

    let on_clear = {
        let roster = props.roster.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |_| {
            let mut next = roster.clone();
            next.clear();
            on_change.emit(next);
        })
    };

    let on_next = {
        let on_next = props.on_next.clone();
        Callback::from(move |_| on_next.emit(()))
    };

    let rows = props
        .roster
        .entries()
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let duplicate = counts.get(&entry.name).copied().unwrap_or(0) > 1;
            let on_remove = {
                let roster = props.roster.clone();
                let on_change = props.on_change.clone();
                let id = entry.id.clone();
                Callback::from(move |_| {
                    let mut next = roster.clone();
                    next.remove(&id);
                    on_change.emit(next);
                })
            };
            html! {
                <li key={entry.id.clone()} class={classes!("roster-row", duplicate.then_some("duplicate"))}>
                    <span class="roster-index">{ format!("{}.", index + 1) }</span>
                    <span class="roster-name">{ &entry.name }</span>
                    if duplicate {
                        <span class="badge">{ "重複" }</span>
                    }
                    <button class="remove" onclick={on_remove}>{ "✕" }</button>
                </li>
            }
        })
        .collect::<Html>();

    html! {
        <div class="panel roster-panel">
            <section class="roster-input">
                <h2>{ "1. 建立參與名單" }</h2>
                <p class="hint">{ "請貼上姓名（每行一個）或上傳 CSV。" }</p>
                <textarea
                    placeholder="王小明\n李大華\n陳小姐..."
                    value={(*text_input).clone()}
                    oninput={on_text_input}
                />
                <div class="button-row">
                    <button class="primary" onclick={on_add_text}>{ "加入名單" }</button>
                    <label class="upload">
                        { "上傳 CSV" }
                        <input type="file" accept=".csv,.txt" onchange={on_upload} />
                    </label>
                </div>
                <button class="ghost" onclick={on_sample}>{ "✨ 使用範例資料" }</button>
            </section>
            <section class="roster-list">
                <div class="roster-list-head">
                    <h2>{ "2. 目前名單" }</h2>
                    <span class="count">{ format!("{} 人", props.roster.len()) }</span>
                    if has_duplicates {
                        <button class="warn" onclick={on_dedupe}>{ "移除重複項" }</button>
                    }
                </div>
                if props.roster.is_empty() {
                    <p class="empty">{ "目前名單還是空的。" }</p>
                } else {
                    <ul class="roster-rows">{ rows }</ul>
                    <button class="ghost" onclick={on_clear}>{ "清除全部名單" }</button>
                }
            </section>
            if !props.roster.is_empty() {
                <div class="next-row">
                    <button class="primary big" onclick={on_next}>{ "前往抽籤！ →" }</button>
                </div>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct DrawPanelProps {
    roster: Roster,
}

#[function_component(DrawPanel)]
fn draw_panel(props: &DrawPanelProps) -> Html {
    let engine = use_mut_ref(|| RaffleEngine::new(props.roster.entries()));
    let rng = use_mut_ref(|| SplitMix64::new(time_seed()));
    let spin_handle = use_mut_ref(|| None::<Interval>);

    let display = use_state(|| engine.borrow().display().to_string());
    let winners = use_state(Vec::<Participant>::new);
    let spinning = use_state(|| false);
    let pool_len = use_state(|| engine.borrow().pool_len());
    let allow_repeats = use_state(|| false);

    // Orphaned timer callbacks must not outlive the panel.
    {
        let spin_handle = spin_handle.clone();
        use_effect_with((), move |_| {
            move || {
                spin_handle.borrow_mut().take();
            }
        });
    }

    let on_start = {
        let engine = engine.clone();
        let rng = rng.clone();
        let spin_handle = spin_handle.clone();
        let display = display.clone();
        let winners = winners.clone();
        let spinning = spinning.clone();
        let pool_len = pool_len.clone();
        let roster = props.roster.clone();
        Callback::from(move |_| {
            match engine.borrow_mut().begin_spin(roster.entries()) {
                Ok(()) => {}
                Err(DrawError::SpinBusy) => return,
                Err(DrawError::EmptyPool) => {
                    gloo::dialogs::alert(EMPTY_POOL_NOTICE);
                    return;
                }
            }
            spinning.set(true);
            let engine = engine.clone();
            let rng = rng.clone();
            let display = display.clone();
            let winners = winners.clone();
            let spinning = spinning.clone();
            let pool_len = pool_len.clone();
            let roster = roster.clone();
            let handle_slot = spin_handle.clone();
            let interval = Interval::new(SPIN_TICK_MS, move || {
                let finished = engine
                    .borrow_mut()
                    .spin_tick(roster.entries(), &mut rng.borrow_mut());
                let snapshot = engine.borrow();
                display.set(snapshot.display().to_string());
                if finished.is_some() {
                    winners.set(snapshot.winners().to_vec());
                    pool_len.set(snapshot.pool_len());
                    spinning.set(false);
                    handle_slot.borrow_mut().take();
                }
            });
            *spin_handle.borrow_mut() = Some(interval);
        })
    };

    let on_mode_toggle = {
        let engine = engine.clone();
        let allow_repeats = allow_repeats.clone();
        let pool_len = pool_len.clone();
        let roster = props.roster.clone();
        Callback::from(move |event: Event| {
            let Some(input) = event.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let repeats = input.checked();
            let mode = if repeats {
                DrawMode::WithReplacement
            } else {
                DrawMode::WithoutReplacement
            };
            engine.borrow_mut().set_mode(mode, roster.entries());
            allow_repeats.set(repeats);
            pool_len.set(engine.borrow().pool_len());
        })
    };

    let on_reset = {
        let engine = engine.clone();
        let spin_handle = spin_handle.clone();
        let display = display.clone();
        let winners = winners.clone();
        let spinning = spinning.clone();
        let pool_len = pool_len.clone();
        let roster = props.roster.clone();
        Callback::from(move |_| {
            spin_handle.borrow_mut().take();
            let mut engine = engine.borrow_mut();
            engine.reset(roster.entries());
            display.set(engine.display().to_string());
            winners.set(Vec::new());
            spinning.set(false);
            pool_len.set(engine.pool_len());
        })
    };

    let start_disabled = *spinning || (!*allow_repeats && *pool_len == 0);
    let winner_chips = winners
        .iter()
        .enumerate()
        .map(|(index, winner)| {
            html! {
                <span key={index} class="winner-chip">{ format!("🏆 {}", winner.name) }</span>
            }
        })
        .collect::<Html>();

    html! {
        <div class="panel draw-panel">
            <h2>{ "活動幸運大抽籤" }</h2>
            <p class="hint">{ "今天的幸運得主會是誰呢？" }</p>
            <div class="draw-options">
                <label class="checkbox">
                    <input
                        type="checkbox"
                        checked={*allow_repeats}
                        disabled={*spinning}
                        onchange={on_mode_toggle}
                    />
                    { "允許重複中獎" }
                </label>
                <button class="ghost" onclick={on_reset}>{ "重置抽籤" }</button>
            </div>
            <div class={classes!("draw-stage", spinning.then_some("spinning"))}>
                <span class="draw-name">{ (*display).clone() }</span>
            </div>
            <button class="primary big" disabled={start_disabled} onclick={on_start}>
                { if *spinning { "正在抽獎中..." } else { "開始抽籤" } }
            </button>
            <section class="winner-list">
                <h3>{ "得獎名單" }</h3>
                if winners.is_empty() {
                    <p class="empty">{ "尚無中獎紀錄。" }</p>
                } else {
                    <div class="winner-chips">{ winner_chips }</div>
                }
            </section>
            if !*allow_repeats {
                <p class="hint">{ format!("剩餘候選人數：{} 人", *pool_len) }</p>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct GroupPanelProps {
    roster: Roster,
}

#[function_component(GroupPanel)]
fn group_panel(props: &GroupPanelProps) -> Html {
    let board = use_mut_ref(GroupBoard::new);
    let rng = use_mut_ref(|| SplitMix64::new(time_seed()));
    let groups = use_state(Vec::<Group>::new);
    let group_size = use_state(|| DEFAULT_GROUP_SIZE.min(props.roster.len()).max(1));
    let naming_busy = use_state(|| false);

    let on_size_input = {
        let group_size = group_size.clone();
        let roster_len = props.roster.len();
        Callback::from(move |event: InputEvent| {
            let Some(input) = event.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let raw = input.value().parse::<i64>().unwrap_or(1);
            group_size.set(clamp_group_size(raw, roster_len));
        })
    };

    let on_generate = {
        let board = board.clone();
        let rng = rng.clone();
        let groups = groups.clone();
        let group_size = group_size.clone();
        let naming_busy = naming_busy.clone();
        let roster = props.roster.clone();
        Callback::from(move |_| {
            let size = clamp_group_size(*group_size as i64, roster.len());
            let generation = {
                let mut board = board.borrow_mut();
                match board.regenerate(roster.entries(), size, &mut rng.borrow_mut()) {
                    Ok(generation) => generation,
                    Err(err) => {
                        gloo::console::warn!("grouping:", err.to_string());
                        return;
                    }
                }
            };
            let count = board.borrow().groups().len();
            groups.set(board.borrow().groups().to_vec());
            naming_busy.set(true);

            let board = board.clone();
            let groups = groups.clone();
            let naming_busy = naming_busy.clone();
            spawn_local(async move {
                if let Some(names) = request_team_names(count, TEAM_NAMES_THEME).await {
                    let mut board = board.borrow_mut();
                    if board.apply_names(generation, &names) {
                        groups.set(board.groups().to_vec());
                    }
                }
                if board.borrow().generation() == generation {
                    naming_busy.set(false);
                }
            });
        })
    };

    let on_download = {
        let board = board.clone();
        Callback::from(move |_| {
            let board = board.borrow();
            if board.is_empty() {
                return;
            }
            download_text(
                &csv_filename(),
                "text/csv;charset=utf-8;",
                &groups_csv(board.groups()),
            );
        })
    };

    let cards = groups
        .iter()
        .map(|group| {
            let members = group
                .members
                .iter()
                .map(|member| {
                    html! { <li key={member.id.clone()}>{ &member.name }</li> }
                })
                .collect::<Html>();
            html! {
                <div key={group.id} class="group-card">
                    <div class="group-card-head">
                        <h3 title={group.name.clone()}>{ &group.name }</h3>
                        <span class="count">{ format!("{} 人", group.members.len()) }</span>
                    </div>
                    <ul>{ members }</ul>
                </div>
            }
        })
        .collect::<Html>();

    html! {
        <div class="panel group-panel">
            <div class="group-head">
                <div>
                    <h2>{ "智能分組工具" }</h2>
                    <p class="hint">{ "快速將參與成員隨機分配到各個小組，並由 AI 命名。" }</p>
                </div>
                <div class="group-controls">
                    <label for="group-size">{ "每組人數" }</label>
                    <input
                        id="group-size"
                        type="number"
                        min="1"
                        max={props.roster.len().to_string()}
                        value={group_size.to_string()}
                        oninput={on_size_input}
                    />
                    <button class="primary" disabled={*naming_busy} onclick={on_generate}>
                        { if *naming_busy { "AI 思考中..." } else { "開始分組" } }
                    </button>
                </div>
            </div>
            if groups.is_empty() {
                <p class="empty">
                    { format!("點擊「開始分組」來分配 {} 位成員。", props.roster.len()) }
                </p>
            } else {
                <div class="group-grid">{ cards }</div>
                <div class="next-row">
                    <button class="dark" onclick={on_download}>{ "下載分組結果 (CSV)" }</button>
                    <p class="hint">{ "隊名由 AI 創意生成" }</p>
                </div>
            }
        </div>
    }
}

#[function_component(App)]
fn app() -> Html {
    let view = use_state(|| View::Roster);
    let roster = use_state(|| load_saved_roster().unwrap_or_else(|| Roster::new(time_seed())));

    let on_roster_change = {
        let roster = roster.clone();
        Callback::from(move |next: Roster| {
            save_roster(&next);
            roster.set(next);
        })
    };

    let on_next = {
        let view = view.clone();
        Callback::from(move |_| view.set(View::Draw))
    };

    let tab = |target: View, label: &str, disabled: bool| {
        let view_handle = view.clone();
        let onclick = Callback::from(move |_| view_handle.set(target));
        let active = *view == target;
        html! {
            <button
                class={classes!("tab", active.then_some("active"))}
                disabled={disabled}
                onclick={onclick}
            >
                { label }
            </button>
        }
    };

    let roster_empty = roster.is_empty();
    let body = match *view {
        View::Roster => html! {
            <RosterPanel
                roster={(*roster).clone()}
                on_change={on_roster_change}
                on_next={on_next}
            />
        },
        View::Draw => html! { <DrawPanel roster={(*roster).clone()} /> },
        View::Grouping => html! { <GroupPanel roster={(*roster).clone()} /> },
    };

    html! {
        <main class="app">
            <header>
                <h1>{ "HR 專業行政助手" }</h1>
                <p class="hint">{ "輕鬆管理您的團隊活動、獎品抽籤與自動分組。" }</p>
            </header>
            <nav class="tabs">
                { tab(View::Roster, "名單管理", false) }
                { tab(View::Draw, "獎品抽籤", roster_empty) }
                { tab(View::Grouping, "自動分組", roster_empty) }
            </nav>
            { body }
            <footer class="hint">{ "HR Pro Toolbox • 由 AI 提供創意支援" }</footer>
        </main>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn group_size_clamps_to_roster_bounds() {
        assert_eq!(clamp_group_size(0, 10), 1);
        assert_eq!(clamp_group_size(-3, 10), 1);
        assert_eq!(clamp_group_size(4, 10), 4);
        assert_eq!(clamp_group_size(99, 10), 10);
        assert_eq!(clamp_group_size(5, 0), 1);
    }

    #[wasm_bindgen_test]
    fn team_names_parse_requires_a_string_array() {
        assert_eq!(
            team_names_from_json(" [\"紅隊\", \"藍隊\"] "),
            Some(vec!["紅隊".to_string(), "藍隊".to_string()])
        );
        assert_eq!(team_names_from_json("{\"names\": []}"), None);
        assert_eq!(team_names_from_json("not json"), None);
        assert_eq!(team_names_from_json("[1, 2]"), None);
    }

    #[wasm_bindgen_test]
    fn roster_snapshot_survives_base64() {
        let mut roster = Roster::new(42);
        roster.append_names(["甲", "乙"]);
        let bytes = encode_snapshot(&snapshot_roster(&roster)).expect("encodes");
        let encoded = STANDARD.encode(&bytes);
        let decoded = STANDARD.decode(encoded.as_bytes()).expect("base64");
        let snapshot = decode_snapshot(&decoded).expect("decodes");
        assert_eq!(restore_roster(&snapshot), Some(roster));
    }
}
