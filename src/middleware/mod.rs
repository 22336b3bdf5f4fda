//! Request pipeline stages and their assembly.
//!
//! Stage order, outermost first:
//! 1. diagnostics (developer pages, or generic error page + HSTS)
//! 2. HTTPS redirection
//! 3. static files
//! 4. authentication
//! 5. routing

pub mod authentication;
pub mod diagnostics;
pub mod https;

use std::path::PathBuf;

use axum::{middleware, Router};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};

use crate::identity::SessionIssuer;
use crate::infrastructure::config::{Config, Environment};

pub use authentication::{require_authenticated, Principal};
pub use diagnostics::{ErrorKind, ErrorReport};
pub use https::{HstsOptions, HttpsRedirectionOptions};

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub environment: Environment,
    pub static_dir: PathBuf,
    pub https_port: Option<u16>,
    /// Honor `X-Forwarded-Proto` in redirection and HSTS
    pub trust_forwarded_proto: bool,
    pub hsts: HstsOptions,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            environment: config.environment,
            static_dir: config.static_dir.clone(),
            https_port: config.https_port,
            trust_forwarded_proto: config.trust_forwarded_proto,
            hsts: HstsOptions {
                include_subdomains: config.hsts_include_subdomains,
                preload: config.hsts_preload,
                ..HstsOptions::default()
            },
        }
    }
}

/// Wraps the routing layer in the ordered request pipeline.
/// The environment branch is chosen here, once.
pub fn pipeline(routes: Router, sessions: SessionIssuer, options: &PipelineOptions) -> Router {
    let authenticated = routes.layer(middleware::from_fn_with_state(
        sessions,
        authentication::authenticate,
    ));

    let static_files = ServeDir::new(&options.static_dir)
        .append_index_html_on_directories(false)
        .call_fallback_on_method_not_allowed(true)
        .fallback(authenticated);

    if options.https_port.is_none() {
        tracing::warn!("Failed to determine the https port for redirect.");
    }

    let app = Router::new()
        .fallback_service(static_files)
        .layer(middleware::from_fn_with_state(
            HttpsRedirectionOptions {
                https_port: options.https_port,
                trust_forwarded_proto: options.trust_forwarded_proto,
            },
            https::redirect_to_https,
        ));

    let app = if options.environment.is_development() {
        tracing::info!("Developer exception and database error pages enabled");
        app.layer(CatchPanicLayer::custom(diagnostics::panic_response))
            .layer(middleware::from_fn(diagnostics::database_error_page))
            .layer(middleware::from_fn(diagnostics::developer_exception_page))
    } else {
        app.layer(CatchPanicLayer::custom(diagnostics::panic_response))
            .layer(middleware::from_fn(diagnostics::exception_handler))
            .layer(middleware::from_fn_with_state(
                HstsOptions {
                    trust_forwarded_proto: options.trust_forwarded_proto,
                    ..options.hsts.clone()
                },
                https::hsts,
            ))
    };

    app.layer(TraceLayer::new_for_http())
}
