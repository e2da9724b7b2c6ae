//! Action dispatcher — the five operations exposed to the orchestrator.
//!
//! Each invocation performs exactly one action. Every write records the
//! triggering action (and, for set-active and toggle, the previous color)
//! in the row's metadata as an audit trail; nothing reads it back for
//! control logic.

use std::collections::HashMap;
use std::fmt;

use tracing::{info, warn};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::repo::StateRepository;
use crate::store::TableStore;

const META_ACTION: &str = "action";
const META_PREVIOUS_COLOR: &str = "previous_color";

/// The operations this tool can perform, parsed from the orchestrator's
/// `action` input. Matching is exhaustive; unknown strings never get past
/// [`Action::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Init,
    GetActive,
    SetActive,
    GetInactive,
    Toggle,
}

impl Action {
    pub fn parse(input: &str) -> Result<Self> {
        match input {
            "init" => Ok(Action::Init),
            "get-active" => Ok(Action::GetActive),
            "set-active" => Ok(Action::SetActive),
            "get-inactive" => Ok(Action::GetInactive),
            "toggle" => Ok(Action::Toggle),
            _ => Err(Error::UnknownAction(input.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Init => "init",
            Action::GetActive => "get-active",
            Action::SetActive => "set-active",
            Action::GetInactive => "get-inactive",
            Action::Toggle => "toggle",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-invocation parameters, built once at the boundary.
#[derive(Debug, Clone)]
pub struct Request {
    pub deployment_key: String,
    /// Target color for set-active. Absent or empty means missing.
    pub color: Option<String>,
    /// Color written by init when no state exists yet.
    pub initial_color: String,
}

/// What an action produced. Fields are `None` when the action does not
/// report them.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub active: Color,
    pub inactive: Color,
    /// Pre-write color, reported by set-active and toggle.
    pub previous: Option<Color>,
    /// Whether this invocation created the backing table (init only).
    pub table_created: Option<bool>,
    /// Whether init found state already present (init only).
    pub was_existing: Option<bool>,
}

impl Outcome {
    fn pair(active: Color) -> Self {
        Self {
            active,
            inactive: active.complement(),
            previous: None,
            table_created: None,
            was_existing: None,
        }
    }
}

/// Run one action against the repository.
pub async fn dispatch<S: TableStore>(
    repo: &StateRepository<S>,
    action: Action,
    request: &Request,
) -> Result<Outcome> {
    match action {
        Action::Init => init(repo, request).await,
        // get-inactive is get-active with the caller reading the other field.
        Action::GetActive | Action::GetInactive => get_active(repo, request).await,
        Action::SetActive => set_active(repo, request).await,
        Action::Toggle => toggle(repo, request).await,
    }
}

async fn init<S: TableStore>(repo: &StateRepository<S>, request: &Request) -> Result<Outcome> {
    let table_created = repo.ensure_table().await?;

    if let Some(state) = repo.get(&request.deployment_key).await? {
        warn!(
            key = %request.deployment_key,
            color = %state.active_color,
            "state already initialized, leaving it unchanged"
        );
        return Ok(Outcome {
            table_created: Some(table_created),
            was_existing: Some(true),
            ..Outcome::pair(state.active_color)
        });
    }

    let initial = Color::parse(&request.initial_color)?;
    let metadata = HashMap::from([(
        META_ACTION.to_string(),
        Action::Init.as_str().to_string(),
    )]);
    repo.put(&request.deployment_key, initial, metadata).await?;
    info!(key = %request.deployment_key, color = %initial, "initialized deployment state");

    Ok(Outcome {
        table_created: Some(table_created),
        was_existing: Some(false),
        ..Outcome::pair(initial)
    })
}

async fn get_active<S: TableStore>(
    repo: &StateRepository<S>,
    request: &Request,
) -> Result<Outcome> {
    repo.ensure_table().await?;
    let state = repo
        .get(&request.deployment_key)
        .await?
        .ok_or_else(|| Error::StateNotFound(request.deployment_key.clone()))?;
    Ok(Outcome::pair(state.active_color))
}

async fn set_active<S: TableStore>(
    repo: &StateRepository<S>,
    request: &Request,
) -> Result<Outcome> {
    // Validate before touching the store at all.
    let raw = request.color.as_deref().unwrap_or("");
    if raw.is_empty() {
        return Err(Error::MissingInput("color"));
    }
    let target = Color::parse(raw)?;

    repo.ensure_table().await?;
    // Read only to capture the previous color; absent state is fine here.
    let previous = repo
        .get(&request.deployment_key)
        .await?
        .map(|s| s.active_color);

    let mut metadata = HashMap::from([(
        META_ACTION.to_string(),
        Action::SetActive.as_str().to_string(),
    )]);
    if let Some(prev) = previous {
        metadata.insert(META_PREVIOUS_COLOR.to_string(), prev.to_string());
    }
    repo.put(&request.deployment_key, target, metadata).await?;
    info!(
        key = %request.deployment_key,
        from = ?previous.map(Color::as_str),
        to = %target,
        "set active color"
    );

    Ok(Outcome {
        previous,
        ..Outcome::pair(target)
    })
}

async fn toggle<S: TableStore>(repo: &StateRepository<S>, request: &Request) -> Result<Outcome> {
    repo.ensure_table().await?;
    let state = repo
        .get(&request.deployment_key)
        .await?
        .ok_or_else(|| Error::StateNotFound(request.deployment_key.clone()))?;

    let previous = state.active_color;
    let next = previous.complement();
    let metadata = HashMap::from([
        (
            META_ACTION.to_string(),
            Action::Toggle.as_str().to_string(),
        ),
        (META_PREVIOUS_COLOR.to_string(), previous.to_string()),
    ]);
    repo.put(&request.deployment_key, next, metadata).await?;
    info!(
        key = %request.deployment_key,
        from = %previous,
        to = %next,
        "toggled active color"
    );

    Ok(Outcome {
        previous: Some(previous),
        ..Outcome::pair(next)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::types::Provenance;

    fn repo(store: MemoryStore) -> StateRepository<MemoryStore> {
        StateRepository::new(store, Provenance::default())
    }

    fn request(key: &str) -> Request {
        Request {
            deployment_key: key.to_string(),
            color: None,
            initial_color: "blue".to_string(),
        }
    }

    async fn seed(repo: &StateRepository<MemoryStore>, key: &str, color: Color) {
        repo.put(key, color, HashMap::new()).await.unwrap();
    }

    // ── init ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn init_creates_table_and_state() {
        let repo = repo(MemoryStore::new());

        let outcome = dispatch(&repo, Action::Init, &request("svc-a")).await.unwrap();

        assert_eq!(outcome.active, Color::Blue);
        assert_eq!(outcome.inactive, Color::Green);
        assert_eq!(outcome.table_created, Some(true));
        assert_eq!(outcome.was_existing, Some(false));

        let row = repo.store().row("svc-a").unwrap();
        assert_eq!(row.active_color, "blue");
        assert_eq!(row.metadata.get(META_ACTION).map(String::as_str), Some("init"));
        assert_eq!(repo.store().create_calls(), 1);
        assert_eq!(repo.store().wait_calls(), 1);
    }

    #[tokio::test]
    async fn init_honors_configured_initial_color() {
        let repo = repo(MemoryStore::new());
        let mut req = request("svc-a");
        req.initial_color = "Green".to_string();

        let outcome = dispatch(&repo, Action::Init, &req).await.unwrap();
        assert_eq!(outcome.active, Color::Green);
        assert_eq!(repo.store().row("svc-a").unwrap().active_color, "green");
    }

    #[tokio::test]
    async fn init_does_not_overwrite_existing_state() {
        let repo = repo(MemoryStore::with_table());
        seed(&repo, "svc-a", Color::Green).await;
        let puts_before = repo.store().put_calls();

        let outcome = dispatch(&repo, Action::Init, &request("svc-a")).await.unwrap();

        assert_eq!(outcome.active, Color::Green);
        assert_eq!(outcome.table_created, Some(false));
        assert_eq!(outcome.was_existing, Some(true));
        assert_eq!(repo.store().put_calls(), puts_before, "init must not rewrite");
    }

    #[tokio::test]
    async fn init_rejects_invalid_initial_color() {
        let repo = repo(MemoryStore::new());
        let mut req = request("svc-a");
        req.initial_color = "red".to_string();

        let err = dispatch(&repo, Action::Init, &req).await.unwrap_err();
        assert!(matches!(err, Error::InvalidColor(c) if c == "red"));
        assert_eq!(repo.store().put_calls(), 0);
    }

    // ── get-active / get-inactive ──────────────────────────────────

    #[tokio::test]
    async fn get_active_returns_the_pair() {
        let repo = repo(MemoryStore::with_table());
        seed(&repo, "svc-a", Color::Green).await;

        let outcome = dispatch(&repo, Action::GetActive, &request("svc-a"))
            .await
            .unwrap();
        assert_eq!(outcome.active, Color::Green);
        assert_eq!(outcome.inactive, Color::Blue);
        assert_eq!(outcome.previous, None);
    }

    #[tokio::test]
    async fn get_inactive_matches_get_active() {
        let repo = repo(MemoryStore::with_table());
        seed(&repo, "svc-a", Color::Blue).await;

        let outcome = dispatch(&repo, Action::GetInactive, &request("svc-a"))
            .await
            .unwrap();
        assert_eq!(outcome.active, Color::Blue);
        assert_eq!(outcome.inactive, Color::Green);
    }

    #[tokio::test]
    async fn get_active_without_state_fails_and_never_writes() {
        let repo = repo(MemoryStore::with_table());

        let err = dispatch(&repo, Action::GetActive, &request("svc-a"))
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::StateNotFound(k) if k == "svc-a"));
        assert!(err.to_string().contains("init"), "message must point at init");
        assert_eq!(repo.store().put_calls(), 0);
    }

    #[tokio::test]
    async fn get_inactive_without_state_fails() {
        let repo = repo(MemoryStore::with_table());
        let err = dispatch(&repo, Action::GetInactive, &request("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StateNotFound(_)));
    }

    // ── set-active ─────────────────────────────────────────────────

    #[tokio::test]
    async fn set_active_captures_previous_color() {
        let repo = repo(MemoryStore::with_table());
        seed(&repo, "svc-a", Color::Blue).await;

        let mut req = request("svc-a");
        req.color = Some("green".to_string());
        let outcome = dispatch(&repo, Action::SetActive, &req).await.unwrap();

        assert_eq!(outcome.active, Color::Green);
        assert_eq!(outcome.inactive, Color::Blue);
        assert_eq!(outcome.previous, Some(Color::Blue));

        let row = repo.store().row("svc-a").unwrap();
        assert_eq!(
            row.metadata.get(META_PREVIOUS_COLOR).map(String::as_str),
            Some("blue")
        );
        assert_eq!(
            row.metadata.get(META_ACTION).map(String::as_str),
            Some("set-active")
        );
    }

    #[tokio::test]
    async fn set_active_on_absent_state_has_no_previous() {
        let repo = repo(MemoryStore::with_table());
        let mut req = request("svc-a");
        req.color = Some("GREEN".to_string());

        let outcome = dispatch(&repo, Action::SetActive, &req).await.unwrap();
        assert_eq!(outcome.active, Color::Green);
        assert_eq!(outcome.previous, None);

        let row = repo.store().row("svc-a").unwrap();
        assert!(!row.metadata.contains_key(META_PREVIOUS_COLOR));
    }

    #[tokio::test]
    async fn set_active_without_color_is_missing_input() {
        let repo = repo(MemoryStore::new());

        let err = dispatch(&repo, Action::SetActive, &request("svc-a"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput("color")));
        // Rejected before any store call.
        assert_eq!(repo.store().create_calls(), 0);
        assert_eq!(repo.store().put_calls(), 0);
    }

    #[tokio::test]
    async fn set_active_with_empty_color_is_missing_input() {
        let repo = repo(MemoryStore::new());
        let mut req = request("svc-a");
        req.color = Some(String::new());

        let err = dispatch(&repo, Action::SetActive, &req).await.unwrap_err();
        assert!(matches!(err, Error::MissingInput("color")));
    }

    #[tokio::test]
    async fn set_active_with_invalid_color_performs_no_write() {
        let repo = repo(MemoryStore::with_table());
        seed(&repo, "svc-a", Color::Blue).await;
        let puts_before = repo.store().put_calls();

        let mut req = request("svc-a");
        req.color = Some("purple".to_string());
        let err = dispatch(&repo, Action::SetActive, &req).await.unwrap_err();

        assert!(matches!(err, Error::InvalidColor(_)));
        assert_eq!(repo.store().put_calls(), puts_before);
        assert_eq!(repo.store().row("svc-a").unwrap().active_color, "blue");
    }

    // ── toggle ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn toggle_twice_round_trips() {
        let repo = repo(MemoryStore::with_table());
        seed(&repo, "svc-a", Color::Blue).await;

        let first = dispatch(&repo, Action::Toggle, &request("svc-a")).await.unwrap();
        assert_eq!(first.active, Color::Green);
        assert_eq!(first.inactive, Color::Blue);
        assert_eq!(first.previous, Some(Color::Blue));

        let second = dispatch(&repo, Action::Toggle, &request("svc-a")).await.unwrap();
        assert_eq!(second.active, Color::Blue);
        assert_eq!(second.previous, Some(Color::Green));

        let row = repo.store().row("svc-a").unwrap();
        assert_eq!(row.active_color, "blue");
        assert_eq!(
            row.metadata.get(META_PREVIOUS_COLOR).map(String::as_str),
            Some("green")
        );
    }

    #[tokio::test]
    async fn toggle_without_state_fails_and_never_writes() {
        let repo = repo(MemoryStore::with_table());

        let err = dispatch(&repo, Action::Toggle, &request("svc-a"))
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::StateNotFound(k) if k == "svc-a"));
        assert_eq!(repo.store().put_calls(), 0);
    }

    // ── action parsing ─────────────────────────────────────────────

    #[test]
    fn parse_recognizes_all_five_actions() {
        for (input, expected) in [
            ("init", Action::Init),
            ("get-active", Action::GetActive),
            ("set-active", Action::SetActive),
            ("get-inactive", Action::GetInactive),
            ("toggle", Action::Toggle),
        ] {
            assert_eq!(Action::parse(input).unwrap(), expected);
            assert_eq!(expected.as_str(), input);
        }
    }

    #[test]
    fn parse_unknown_action_enumerates_the_valid_set() {
        let err = Action::parse("destroy").unwrap_err();
        assert!(matches!(&err, Error::UnknownAction(s) if s == "destroy"));
        let message = err.to_string();
        for valid in ["init", "get-active", "set-active", "get-inactive", "toggle"] {
            assert!(message.contains(valid), "message missing {valid}: {message}");
        }
    }
}
