pub mod server {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use serde::Serialize;

    use crate::rpc;
    use crate::service::key_rate;

    #[derive(Clone)]
    pub struct AppState {
        cbr: Arc<rpc::cbr::Client>,
    }

    mod urls {
        pub const KEY_RATE_DELTA: &str = "/api/v1/key_rate/delta";
    }

    mod request {
        use serde::Deserialize;

        #[derive(Deserialize, Debug)]
        pub struct KeyRateDelta {
            pub delta: Option<String>,
            pub period: Option<String>,
        }
    }

    #[derive(Serialize, Debug)]
    pub struct ErrorBody {
        pub error: String,
    }

    mod handlers {
        use axum::http::StatusCode;
        use axum::{extract, Json};
        use tracing::error;

        use crate::http::server::{request, status_for, AppState, ErrorBody};
        use crate::service::key_rate;

        pub async fn key_rate_delta(
            extract::State(state): extract::State<AppState>,
            extract::Query(req): extract::Query<request::KeyRateDelta>,
        ) -> Result<Json<key_rate::Report>, (StatusCode, Json<ErrorBody>)> {
            let today = chrono::Local::now().date_naive();
            let delta = req.delta.as_deref().map(key_rate::DeltaInput::parse);
            let period = req.period.as_deref().map(key_rate::PeriodInput::parse);

            let reject = |err: key_rate::Error| {
                error!("key rate delta check failed: {err}");
                (status_for(&err), Json(ErrorBody { error: err.to_string() }))
            };

            let check = key_rate::Check::new(delta, period, today).map_err(&reject)?;
            let report = check.run(state.cbr.as_ref()).await.map_err(&reject)?;

            Ok(Json(report))
        }
    }

    fn status_for(err: &key_rate::Error) -> StatusCode {
        match err {
            key_rate::Error::InvalidDelta(_) | key_rate::Error::InvalidPeriod(_) => {
                StatusCode::BAD_REQUEST
            }
            key_rate::Error::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub async fn init(cbr: rpc::cbr::Client, addr: &str) {
        let state = AppState {
            cbr: Arc::new(cbr),
        };

        let app = Router::new()
            .route(urls::KEY_RATE_DELTA, get(handlers::key_rate_delta))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("unable to bind server address");

        axum::serve(listener, app)
            .await
            .expect("unable to serve requests");
    }

}
