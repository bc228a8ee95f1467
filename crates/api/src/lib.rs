// Webhook listener for the alert relay.
//
// Endpoints:
// - POST /webhook — accept a Grafana alert and queue it for delivery
// - GET  /health  — liveness plus current queue depth
pub mod routes;
pub mod state;
