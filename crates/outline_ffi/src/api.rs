//! FFI use-case API for Flutter-facing outline calls.
//!
//! # Responsibility
//! - Expose outline editing sessions (load, search, edit, discard) to Dart
//!   via FRB.
//! - Exchange snapshots and nodes as JSON and node paths as `/0/1` strings.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call returns an envelope; failures are reported in `message`.
//! - Each session owns one `OutlineStore`; sessions never share snapshots.

use log::{info, warn};
use outline_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    LoadPolicy, LogConfig, NodePath, Outline, OutlineError, OutlineMutation, OutlineNode,
    OutlineStore, SearchHit, StoreConfig,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use uuid::Uuid;

static SESSIONS: OnceLock<Mutex<HashMap<String, OutlineStore>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let config = LogConfig::to_dir(level, log_dir.trim());
    match init_logging_inner(&config) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Session handle returned by [`outline_open_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineSessionResponse {
    /// Whether the session was opened.
    pub ok: bool,
    /// Opaque session id for follow-up calls.
    pub session_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

/// Snapshot response envelope shared by load, read and edit calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Current snapshot as JSON after the call (`None` on failure).
    pub snapshot_json: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl OutlineResponse {
    fn success(message: impl Into<String>, snapshot_json: String) -> Self {
        Self {
            ok: true,
            snapshot_json: Some(snapshot_json),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            snapshot_json: None,
            message: message.into(),
        }
    }
}

/// Name hit returned by [`outline_search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineSearchItem {
    /// Stable node ID in string form.
    pub node_id: String,
    /// Node level (`section|unit|activity|content`).
    pub kind: String,
    pub name: String,
    /// Node path, e.g. `/0/1/2`.
    pub path: String,
}

/// Search response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineSearchResponse {
    pub ok: bool,
    /// Filtered outline (matches plus ancestors) as JSON.
    pub snapshot_json: Option<String>,
    /// Nodes whose own name matched, in outline order.
    pub items: Vec<OutlineSearchItem>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Opens an editing session, optionally seeded with a snapshot.
///
/// Input semantics:
/// - `snapshot_json`: serialized outline; `None` or blank opens an empty one.
/// - `strict`: reject non-contiguous inbound orders instead of renumbering.
///
/// # FFI contract
/// - Sync call, in-memory execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn outline_open_session(
    snapshot_json: Option<String>,
    strict: bool,
) -> OutlineSessionResponse {
    let config = StoreConfig {
        load_policy: if strict {
            LoadPolicy::Strict
        } else {
            LoadPolicy::Normalize
        },
        ..StoreConfig::default()
    };

    let store = match snapshot_json.as_deref().map(str::trim) {
        None | Some("") => Ok(OutlineStore::empty(config)),
        Some(text) => parse_outline(text).and_then(|outline| {
            OutlineStore::new(outline, config).map_err(|err| err.to_string())
        }),
    };

    match store {
        Ok(store) => {
            let session_id = Uuid::new_v4().to_string();
            let node_count = store.current().node_count();
            lock_sessions().insert(session_id.clone(), store);
            info!(
                "event=session_open module=ffi status=ok session={} nodes={}",
                session_id, node_count
            );
            OutlineSessionResponse {
                ok: true,
                session_id: Some(session_id),
                message: "Outline session opened.".to_string(),
            }
        }
        Err(err) => {
            warn!("event=session_open module=ffi status=error");
            OutlineSessionResponse {
                ok: false,
                session_id: None,
                message: format!("outline_open_session failed: {err}"),
            }
        }
    }
}

/// Closes a session and drops its store.
///
/// # FFI contract
/// - Sync call; never panics.
/// - Returns the final snapshot of the closed session.
#[flutter_rust_bridge::frb(sync)]
pub fn outline_close_session(session_id: String) -> OutlineResponse {
    let removed = lock_sessions().remove(session_id.trim());
    match removed {
        Some(store) => {
            info!(
                "event=session_close module=ffi status=ok session={}",
                session_id.trim()
            );
            respond("outline_close_session", snapshot_to_json(store.current()))
        }
        None => OutlineResponse::failure(format!(
            "outline_close_session failed: {}",
            unknown_session(&session_id)
        )),
    }
}

/// Replaces the session snapshot wholesale with `snapshot_json`.
///
/// # FFI contract
/// - Sync call; never panics.
/// - Invalid snapshots are rejected and the previous snapshot is kept.
#[flutter_rust_bridge::frb(sync)]
pub fn outline_load(session_id: String, snapshot_json: String) -> OutlineResponse {
    let result = parse_outline(&snapshot_json).and_then(|outline| {
        with_session(&session_id, |store| {
            store
                .replace(outline)
                .map_err(|err| err.to_string())
                .and_then(snapshot_to_json)
        })
    });
    respond("outline_load", result)
}

/// Returns the current session snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn outline_snapshot(session_id: String) -> OutlineResponse {
    let result = with_session(&session_id, |store| snapshot_to_json(store.current()));
    respond("outline_snapshot", result)
}

/// Filters the session snapshot by `keyword` without modifying it.
///
/// # FFI contract
/// - Sync call; never panics.
/// - Blank keyword returns the full snapshot and no items.
#[flutter_rust_bridge::frb(sync)]
pub fn outline_search(session_id: String, keyword: String) -> OutlineSearchResponse {
    let result = with_session(&session_id, |store| {
        let filtered = snapshot_to_json(&store.search(&keyword))?;
        let items = store
            .search_hits(&keyword)
            .into_iter()
            .map(to_search_item)
            .collect::<Vec<_>>();
        Ok((filtered, items))
    });

    match result {
        Ok((snapshot_json, items)) => {
            let message = if items.is_empty() {
                "No results.".to_string()
            } else {
                format!("Found {} result(s).", items.len())
            };
            OutlineSearchResponse {
                ok: true,
                snapshot_json: Some(snapshot_json),
                items,
                message,
            }
        }
        Err(err) => OutlineSearchResponse {
            ok: false,
            snapshot_json: None,
            items: Vec::new(),
            message: format!("outline_search failed: {err}"),
        },
    }
}

/// Inserts a node under `parent_path`.
///
/// Input semantics:
/// - `parent_path`: `/` for a section, `/0` for a unit under section 0, ...
/// - `node_json`: serialized node with a fresh, non-nil `id`.
/// - `at_index`: position among siblings; `None` appends.
#[flutter_rust_bridge::frb(sync)]
pub fn outline_insert(
    session_id: String,
    parent_path: String,
    node_json: String,
    at_index: Option<u32>,
) -> OutlineResponse {
    let mutation = parse_path(&parent_path).and_then(|parent| {
        Ok(OutlineMutation::Insert {
            parent,
            node: parse_node(&node_json)?,
            at_index: at_index.map(|index| index as usize),
        })
    });
    run_mutation("outline_insert", &session_id, mutation)
}

/// Removes the node at `path` with its subtree.
#[flutter_rust_bridge::frb(sync)]
pub fn outline_remove(session_id: String, path: String) -> OutlineResponse {
    let mutation = parse_path(&path).map(|path| OutlineMutation::Remove { path });
    run_mutation("outline_remove", &session_id, mutation)
}

/// Moves the node at `from_path` under `to_parent_path`.
///
/// `to_parent_path` addresses the current snapshot, before the move.
#[flutter_rust_bridge::frb(sync)]
pub fn outline_move(
    session_id: String,
    from_path: String,
    to_parent_path: String,
    to_index: u32,
) -> OutlineResponse {
    let mutation = parse_path(&from_path).and_then(|from| {
        Ok(OutlineMutation::Move {
            from,
            to_parent: parse_path(&to_parent_path)?,
            to_index: to_index as usize,
        })
    });
    run_mutation("outline_move", &session_id, mutation)
}

/// Renames the node at `path`.
#[flutter_rust_bridge::frb(sync)]
pub fn outline_rename(session_id: String, path: String, name: String) -> OutlineResponse {
    let mutation = parse_path(&path).map(|path| OutlineMutation::Rename { path, name });
    run_mutation("outline_rename", &session_id, mutation)
}

/// Applies a JSON array of mutations atomically.
///
/// Each element is tagged by `op` (`insert|remove|move|rename`); paths are
/// index arrays, e.g. `{"op":"remove","path":[0,1]}`.
#[flutter_rust_bridge::frb(sync)]
pub fn outline_apply_batch(session_id: String, mutations_json: String) -> OutlineResponse {
    let result = serde_json::from_str::<Vec<OutlineMutation>>(&mutations_json)
        .map_err(|err| format!("invalid mutation batch JSON: {err}"))
        .and_then(|mutations| {
            with_session(&session_id, |store| {
                store
                    .apply_batch(&mutations)
                    .map_err(|err| err.to_string())
                    .and_then(snapshot_to_json)
            })
        });
    respond("outline_apply_batch", result)
}

/// Drops uncommitted edits and returns the last loaded snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn outline_discard_changes(session_id: String) -> OutlineResponse {
    let result = with_session(&session_id, |store| {
        store
            .discard_changes()
            .map_err(|err| err.to_string())
            .and_then(snapshot_to_json)
    });
    respond("outline_discard_changes", result)
}

fn run_mutation(
    op: &str,
    session_id: &str,
    mutation: Result<OutlineMutation, String>,
) -> OutlineResponse {
    let result = mutation.and_then(|mutation| {
        with_session(session_id, |store| {
            store
                .apply(&mutation)
                .map_err(|err| err.to_string())
                .and_then(snapshot_to_json)
        })
    });
    respond(op, result)
}

fn respond(op: &str, result: Result<String, String>) -> OutlineResponse {
    match result {
        Ok(snapshot_json) => OutlineResponse::success("OK.", snapshot_json),
        Err(err) => OutlineResponse::failure(format!("{op} failed: {err}")),
    }
}

fn with_session<T>(
    session_id: &str,
    f: impl FnOnce(&mut OutlineStore) -> Result<T, String>,
) -> Result<T, String> {
    let mut sessions = lock_sessions();
    let store = sessions
        .get_mut(session_id.trim())
        .ok_or_else(|| unknown_session(session_id))?;
    f(store)
}

fn lock_sessions() -> MutexGuard<'static, HashMap<String, OutlineStore>> {
    SESSIONS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn unknown_session(session_id: &str) -> String {
    format!("unknown outline session `{}`", session_id.trim())
}

fn parse_path(raw: &str) -> Result<NodePath, String> {
    raw.parse::<NodePath>().map_err(|err| err.to_string())
}

fn parse_outline(text: &str) -> Result<Outline, String> {
    serde_json::from_str(text).map_err(|err| format!("invalid outline JSON: {err}"))
}

fn parse_node(text: &str) -> Result<OutlineNode, String> {
    let node: OutlineNode =
        serde_json::from_str(text).map_err(|err| format!("invalid node JSON: {err}"))?;
    if node.id.is_nil() {
        return Err(OutlineError::NilId.to_string());
    }
    Ok(node)
}

fn snapshot_to_json(outline: &Outline) -> Result<String, String> {
    serde_json::to_string(outline).map_err(|err| format!("snapshot encode failed: {err}"))
}

fn to_search_item(hit: SearchHit) -> OutlineSearchItem {
    OutlineSearchItem {
        node_id: hit.node_id.to_string(),
        kind: hit.kind.as_str().to_string(),
        name: hit.name,
        path: hit.path.to_string(),
    }
}
