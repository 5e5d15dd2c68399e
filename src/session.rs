//! Query lifecycle and the per-browser panel slot.
//!
//! Every query captures a generation number when it starts. When it
//! finishes, its result is rendered only if no newer query from the same
//! session has started in the meantime; late results from superseded queries
//! are dropped. Superseded requests are not cancelled.
//!
//! Each browser tab owns one [`QuerySession`], looked up in
//! [`ClientSessions`] by the id the page generates, so clicks in one tab never
//! supersede or overwrite another tab's query.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, warn};

use crate::advice::FilterAdvice;
use crate::constants::ERROR_MESSAGE;
use crate::merge::{AirQualityService, QueryOutcome};
use crate::params::{canonical_label, classify, norm_status, Bucket, NormStatus};
use crate::providers::ProviderError;
use crate::severity::PollutionLevel;
use crate::types::{Coordinates, Measurement, Place};

pub trait Renderer: Send + Sync {
    fn show_loading(&self, at: Coordinates);
    fn show_error(&self, message: &str);
    fn show_result(&self, view: &ResultView);
    fn show_empty(&self, at: Coordinates);
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelView {
    pub level: PollutionLevel,
    pub label: &'static str,
    pub color: &'static str,
}

impl From<PollutionLevel> for LevelView {
    fn from(level: PollutionLevel) -> Self {
        Self {
            level,
            label: level.label(),
            color: level.color(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementView {
    pub parameter: String,
    pub label: String,
    pub value: f64,
    pub unit: String,
    pub bucket: Bucket,
    pub norm: NormStatus,
}

impl From<&Measurement> for MeasurementView {
    fn from(measurement: &Measurement) -> Self {
        Self {
            parameter: measurement.parameter.clone(),
            label: canonical_label(&measurement.parameter),
            value: measurement.value,
            unit: measurement.unit.clone(),
            bucket: classify(&measurement.parameter),
            norm: norm_status(&measurement.parameter, measurement.value),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub place: Place,
    pub coordinates: Coordinates,
    pub level: Option<LevelView>,
    pub advice: FilterAdvice,
    pub current: Vec<MeasurementView>,
    pub extremes: Vec<MeasurementView>,
    pub source: String,
}

impl ResultView {
    pub fn from_outcome(at: Coordinates, outcome: &QueryOutcome) -> Self {
        Self {
            place: outcome.current.place(),
            coordinates: at,
            level: outcome.level().map(LevelView::from),
            advice: outcome.advice(),
            current: outcome
                .current
                .measurements
                .iter()
                .map(MeasurementView::from)
                .collect(),
            extremes: outcome.extremes.iter().map(MeasurementView::from).collect(),
            source: outcome.current.source.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Panel {
    Idle,
    Loading { coordinates: Coordinates },
    Error { message: String },
    Empty { coordinates: Coordinates },
    Result(ResultView),
}

/// The three ways a query can finish. `Idle` and `Loading` are never a
/// completion, so they cannot reach [`QuerySession::complete`].
enum Completion {
    Result(ResultView),
    Empty(Coordinates),
    Error(String),
}

impl Completion {
    fn from_outcome(at: Coordinates, outcome: Result<QueryOutcome, ProviderError>) -> Self {
        match outcome {
            Ok(outcome) if outcome.is_empty() => Completion::Empty(at),
            Ok(outcome) => Completion::Result(ResultView::from_outcome(at, &outcome)),
            Err(error) => {
                warn!("Air quality query at {:.4},{:.4} failed: {error}", at.lat, at.lon);
                Completion::Error(ERROR_MESSAGE.to_string())
            }
        }
    }

    fn render(&self, renderer: &impl Renderer) {
        match self {
            Completion::Result(view) => renderer.show_result(view),
            Completion::Empty(at) => renderer.show_empty(*at),
            Completion::Error(message) => renderer.show_error(message),
        }
    }

    fn into_panel(self) -> Panel {
        match self {
            Completion::Result(view) => Panel::Result(view),
            Completion::Empty(coordinates) => Panel::Empty { coordinates },
            Completion::Error(message) => Panel::Error { message },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueryTicket {
    pub generation: u64,
    pub coordinates: Coordinates,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryReport {
    pub generation: u64,
    /// This query's own panel, whether or not it was rendered.
    pub panel: Panel,
    /// False when a newer query superseded this one before it finished.
    pub rendered: bool,
}

pub struct QuerySession<R> {
    generation: Mutex<u64>,
    renderer: R,
}

impl<R: Renderer> QuerySession<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            generation: Mutex::new(0),
            renderer,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn begin(&self, at: Coordinates) -> QueryTicket {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        self.renderer.show_loading(at);
        QueryTicket {
            generation: *generation,
            coordinates: at,
        }
    }

    /// Renders the outcome if `ticket` is still the latest query. The
    /// generation lock is held while rendering so a newer `begin` cannot
    /// interleave.
    pub fn complete(
        &self,
        ticket: QueryTicket,
        outcome: Result<QueryOutcome, ProviderError>,
    ) -> QueryReport {
        let completion = Completion::from_outcome(ticket.coordinates, outcome);

        let generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        let rendered = *generation == ticket.generation;
        if rendered {
            completion.render(&self.renderer);
        } else {
            debug!(
                "Dropping result of query {} (current is {})",
                ticket.generation, *generation
            );
        }
        drop(generation);

        QueryReport {
            generation: ticket.generation,
            panel: completion.into_panel(),
            rendered,
        }
    }

    pub async fn run(&self, service: &AirQualityService, at: Coordinates) -> QueryReport {
        let ticket = self.begin(at);
        let outcome = service.query(at).await;
        self.complete(ticket, outcome)
    }
}

/// Keeps the latest rendered panel of one session.
pub struct PanelRenderer {
    panel: RwLock<Panel>,
}

impl PanelRenderer {
    pub fn new() -> Self {
        Self {
            panel: RwLock::new(Panel::Idle),
        }
    }

    pub fn snapshot(&self) -> Panel {
        self.panel
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, panel: Panel) {
        *self.panel.write().unwrap_or_else(PoisonError::into_inner) = panel;
    }
}

impl Default for PanelRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PanelRenderer {
    fn show_loading(&self, at: Coordinates) {
        self.replace(Panel::Loading { coordinates: at });
    }

    fn show_error(&self, message: &str) {
        self.replace(Panel::Error {
            message: message.to_string(),
        });
    }

    fn show_result(&self, view: &ResultView) {
        self.replace(Panel::Result(view.clone()));
    }

    fn show_empty(&self, at: Coordinates) {
        self.replace(Panel::Empty { coordinates: at });
    }
}

pub type ClientSession = QuerySession<PanelRenderer>;

struct SessionSlot {
    session: Arc<ClientSession>,
    last_used: u64,
}

#[derive(Default)]
struct SessionTable {
    clock: u64,
    slots: HashMap<String, SessionSlot>,
}

/// Query sessions keyed by browser id. Once `capacity` sessions exist, the
/// least recently used one is evicted to make room.
pub struct ClientSessions {
    capacity: usize,
    table: tokio::sync::Mutex<SessionTable>,
}

impl ClientSessions {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            table: tokio::sync::Mutex::new(SessionTable::default()),
        }
    }

    pub async fn session_for(&self, client: &str) -> Arc<ClientSession> {
        let mut table = self.table.lock().await;
        table.clock += 1;
        let now = table.clock;

        if let Some(slot) = table.slots.get_mut(client) {
            slot.last_used = now;
            return slot.session.clone();
        }

        if table.slots.len() >= self.capacity {
            let oldest = table
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                debug!("Evicting idle client session {oldest}");
                table.slots.remove(&oldest);
            }
        }

        let session = Arc::new(QuerySession::new(PanelRenderer::new()));
        table.slots.insert(
            client.to_string(),
            SessionSlot {
                session: session.clone(),
                last_used: now,
            },
        );
        session
    }

    /// The client's current panel; unknown clients are idle.
    pub async fn panel_for(&self, client: &str) -> Panel {
        self.table
            .lock()
            .await
            .slots
            .get(client)
            .map(|slot| slot.session.renderer().snapshot())
            .unwrap_or(Panel::Idle)
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::advice::DUST_ADVICE_MODERATE;
    use crate::merge::tests::{pm25, FakeProvider, Reply};
    use crate::types::AirQualityData;

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingRenderer {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl Renderer for RecordingRenderer {
        fn show_loading(&self, at: Coordinates) {
            self.record(format!("loading {} {}", at.lat, at.lon));
        }

        fn show_error(&self, message: &str) {
            self.record(format!("error {message}"));
        }

        fn show_result(&self, view: &ResultView) {
            self.record(format!("result {}", view.source));
        }

        fn show_empty(&self, at: Coordinates) {
            self.record(format!("empty {} {}", at.lat, at.lon));
        }
    }

    fn service(current: Reply, extremes: Reply) -> AirQualityService {
        AirQualityService::new(
            None,
            Arc::new(FakeProvider::new("Open-Meteo", current, extremes)),
        )
    }

    fn empty_outcome() -> Result<QueryOutcome, ProviderError> {
        Ok(QueryOutcome {
            current: AirQualityData::new("Open-Meteo", vec![]),
            extremes: vec![],
        })
    }

    #[tokio::test]
    async fn one_completion_call_per_query() {
        let session = QuerySession::new(RecordingRenderer::default());
        let service = service(Reply::Data(vec![pm25(12.4)]), Reply::Data(vec![]));

        let report = session.run(&service, Coordinates::new(1.5, 2.5)).await;

        assert_eq!(report.generation, 1);
        assert!(report.rendered);
        assert!(matches!(report.panel, Panel::Result(_)));
        assert_eq!(
            session.renderer().calls(),
            vec!["loading 1.5 2.5".to_string(), "result Open-Meteo".to_string()]
        );
    }

    #[tokio::test]
    async fn empty_everywhere_shows_empty_state_with_coordinates() {
        let session = QuerySession::new(RecordingRenderer::default());
        let service = service(Reply::Data(vec![]), Reply::Data(vec![]));

        let report = session.run(&service, Coordinates::new(-12.0, 130.25)).await;

        assert_eq!(
            report.panel,
            Panel::Empty {
                coordinates: Coordinates::new(-12.0, 130.25)
            }
        );
        assert_eq!(
            session.renderer().calls().last().map(String::as_str),
            Some("empty -12 130.25")
        );
    }

    #[tokio::test]
    async fn unrecovered_failure_shows_generic_message() {
        let session = QuerySession::new(RecordingRenderer::default());
        let service = service(Reply::Fail, Reply::Fail);

        let report = session.run(&service, Coordinates::new(0.0, 0.0)).await;

        assert_eq!(
            report.panel,
            Panel::Error {
                message: ERROR_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn stale_results_are_reported_but_not_rendered() {
        let session = QuerySession::new(PanelRenderer::new());
        let first = session.begin(Coordinates::new(1.0, 1.0));
        let second = session.begin(Coordinates::new(2.0, 2.0));

        let late = session.complete(first, empty_outcome());
        assert!(!late.rendered);
        assert_eq!(late.generation, 1);
        assert_eq!(
            late.panel,
            Panel::Empty {
                coordinates: Coordinates::new(1.0, 1.0)
            }
        );
        assert_eq!(
            session.renderer().snapshot(),
            Panel::Loading {
                coordinates: Coordinates::new(2.0, 2.0)
            }
        );

        let fresh = session.complete(second, empty_outcome());
        assert!(fresh.rendered);
        assert_eq!(fresh.generation, 2);
        assert_eq!(session.renderer().snapshot(), fresh.panel);
    }

    #[test]
    fn rendered_panel_always_matches_the_report() {
        let session = QuerySession::new(RecordingRenderer::default());
        let ticket = session.begin(Coordinates::new(3.0, 4.0));

        let report = session.complete(ticket, empty_outcome());

        assert!(report.rendered);
        assert_eq!(
            session.renderer().calls(),
            vec!["loading 3 4".to_string(), "empty 3 4".to_string()]
        );
    }

    #[tokio::test]
    async fn clients_get_independent_sessions() {
        let sessions = ClientSessions::new(8);
        let tab_a = sessions.session_for("tab-a").await;
        let tab_b = sessions.session_for("tab-b").await;

        let a = tab_a.begin(Coordinates::new(40.0, 10.0));
        tab_b.begin(Coordinates::new(-7.0, 20.0));
        let report = tab_a.complete(a, empty_outcome());

        assert!(report.rendered);
        assert!(Arc::ptr_eq(&tab_a, &sessions.session_for("tab-a").await));
        assert_eq!(
            sessions.panel_for("tab-a").await,
            Panel::Empty {
                coordinates: Coordinates::new(40.0, 10.0)
            }
        );
        assert_eq!(
            sessions.panel_for("tab-b").await,
            Panel::Loading {
                coordinates: Coordinates::new(-7.0, 20.0)
            }
        );
        assert_eq!(sessions.panel_for("unknown").await, Panel::Idle);
    }

    #[tokio::test]
    async fn least_recently_used_session_is_evicted() {
        let sessions = ClientSessions::new(2);
        let a = sessions.session_for("a").await;
        let b = sessions.session_for("b").await;
        sessions.session_for("a").await;
        let c = sessions.session_for("c").await;
        c.begin(Coordinates::new(5.0, 5.0));

        assert_eq!(sessions.len().await, 2);
        assert!(Arc::ptr_eq(&a, &sessions.session_for("a").await));
        assert!(matches!(sessions.panel_for("c").await, Panel::Loading { .. }));

        // "b" was evicted when "c" arrived; asking for it again evicts "c".
        let b_again = sessions.session_for("b").await;
        assert!(!Arc::ptr_eq(&b, &b_again));
        assert_eq!(sessions.len().await, 2);
        assert_eq!(sessions.panel_for("c").await, Panel::Idle);
    }

    #[test]
    fn result_view_labels_and_norms_each_reading() {
        let outcome = QueryOutcome {
            current: AirQualityData {
                city: Some("Kraków".to_string()),
                country: Some("Poland".to_string()),
                measurements: vec![
                    pm25(12.4),
                    Measurement::new("no2", 30.0, "µg/m³"),
                    Measurement::new("no", 3.0, "µg/m³"),
                ],
                source: "Open-Meteo".to_string(),
            },
            extremes: vec![],
        };

        let view = ResultView::from_outcome(Coordinates::new(50.06, 19.94), &outcome);

        assert_eq!(view.place.city.as_deref(), Some("Kraków"));
        assert_eq!(view.level.as_ref().map(|l| l.level), Some(PollutionLevel::Good));
        assert_eq!(view.advice.dust, DUST_ADVICE_MODERATE);
        assert!(view.advice.gases.is_some());
        let labels: Vec<_> = view.current.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["PM2.5", "NO₂", "NO"]);
        assert_eq!(view.current[1].bucket, Bucket::Gas);
        assert!(matches!(view.current[1].norm, NormStatus::ExceedsNorm { .. }));
        assert_eq!(view.current[2].norm, NormStatus::NoNorm);
    }

    #[test]
    fn panel_json_is_tagged_by_state() {
        let json = serde_json::to_value(Panel::Empty {
            coordinates: Coordinates::new(1.0, 2.0),
        })
        .expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({"state": "empty", "coordinates": {"lat": 1.0, "lon": 2.0}})
        );
    }
}
