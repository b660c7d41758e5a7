use axum::{extract::State, Json};

use crate::activism::{activism_overview, ActivismResponse};
use crate::app::App;

pub async fn activism(State(app): State<App>) -> Json<ActivismResponse> {
    Json(activism_overview(app.db()).await)
}
