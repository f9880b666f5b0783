use axum::{
    extract::State,
    response::Html,
    Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::stats::tracker::{ErrorRecord, InFlightSnapshot};

#[derive(Serialize)]
pub struct StatsSummary {
    pub service: &'static str,
    pub version: &'static str,
    pub started: u64,
    pub completed: u64,
    pub errored: u64,
    pub bytes_relayed: u64,
    pub in_flight: usize,
}

#[derive(Serialize)]
pub struct RequestsView {
    pub in_flight: Vec<InFlightSnapshot>,
    pub recent_errors: Vec<ErrorRecord>,
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsSummary> {
    let snapshot = state.stats.snapshot();
    Json(StatsSummary {
        service: "anthropic-transparent-proxy",
        version: env!("CARGO_PKG_VERSION"),
        started: snapshot.started,
        completed: snapshot.completed,
        errored: snapshot.errored,
        bytes_relayed: snapshot.bytes_relayed,
        in_flight: snapshot.in_flight.len(),
    })
}

pub async fn get_requests(State(state): State<AppState>) -> Json<RequestsView> {
    let snapshot = state.stats.snapshot();
    Json(RequestsView {
        in_flight: snapshot.in_flight,
        recent_errors: snapshot.recent_errors,
    })
}

pub async fn dashboard_page() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Proxy Dashboard</title>
<style>
  body { font-family: monospace; margin: 2rem; background: #111; color: #ddd; }
  input { background: #222; color: #ddd; border: 1px solid #444; padding: 4px; width: 20rem; }
  pre { background: #1a1a1a; padding: 1rem; overflow: auto; }
  h1 { font-size: 1.2rem; }
</style>
</head>
<body>
<h1>anthropic-transparent-proxy</h1>
<p>Access key: <input id="key" type="password" placeholder="dashboard access key">
<button onclick="refresh()">Refresh</button></p>
<pre id="stats">-</pre>
<pre id="requests">-</pre>
<script>
async function fetchJson(path) {
  const key = document.getElementById('key').value;
  const res = await fetch(path, { headers: { 'x-dashboard-key': key } });
  if (!res.ok) { return { error: res.status }; }
  return res.json();
}
async function refresh() {
  document.getElementById('stats').textContent =
    JSON.stringify(await fetchJson('/api/admin/stats'), null, 2);
  document.getElementById('requests').textContent =
    JSON.stringify(await fetchJson('/api/admin/requests'), null, 2);
}
</script>
</body>
</html>
"#;
