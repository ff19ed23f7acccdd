use actix_web::{HttpResponse, Responder, get, web};

use crate::state::AppState;

macros_utils::routes! {
    route configurations_route,
}

/// Baseline configurations this server can evaluate against.
#[get("/configurations")]
pub async fn configurations_route(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.orchestrator.registry().configurations())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use actix_web::{App, test};
    use nodecheck::ConfigurationDescriptor;

    #[actix_web::test]
    async fn test_lists_configurations() {
        let app = test::init_service(App::new().app_data(test_support::state(None)).configure(routes)).await;
        let request = test::TestRequest::get().uri("/configurations").to_request();

        let listed: Vec<ConfigurationDescriptor> = test::call_and_read_body_json(&app, request).await;
        assert_eq!(
            listed,
            vec![ConfigurationDescriptor {
                name: "devnet_fullnode".to_string(),
                pretty_name: "Devnet FullNode".to_string(),
            }]
        );
    }
}
