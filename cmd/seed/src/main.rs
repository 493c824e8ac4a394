//! Seeds a Postgres database with a demo organization, a demo volunteer and
//! one open opportunity. Safe to run repeatedly: existing accounts are reused.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use auth_adapters::JwtAuthProvider;
use configs::Settings;
use domains::{DomainError, NewOpportunity, Role};
use secrecy::ExposeSecret;
use services::{Registration, Services, Session};
use storage_adapters::PgStore;

const DEMO_PASSWORD: &str = "volunteer-hub-demo";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = Settings::load().context("loading settings")?;
    let url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| anyhow!("database.url must be set to seed (VOLUNTEER_HUB__DATABASE__URL)"))?;

    let store = PgStore::connect(url.expose_secret(), settings.database.max_connections)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;

    let auth = Arc::new(JwtAuthProvider::new(
        settings.auth.jwt_secret.expose_secret(),
        settings.auth.token_ttl_hours,
    ));
    let services = Services::new(Arc::new(store), auth);

    let organization = account(&services, "Shoreline Trust", "org@example.org", Role::Organization).await?;
    let volunteer = account(&services, "Sam Rivera", "sam@example.org", Role::Volunteer).await?;

    let caller = services.accounts.authenticate(&organization.token)?;
    let existing = services.opportunities.stats_for_organization(caller.user_id).await?;
    if existing == 0 {
        let opportunity = services
            .opportunities
            .create(
                &caller,
                NewOpportunity {
                    title: "Beach Cleanup".to_string(),
                    description: "Clear litter from the north dunes.".to_string(),
                    location: "North Beach".to_string(),
                    date: "2025-06-01".to_string(),
                },
            )
            .await?;
        tracing::info!(opportunity_id = %opportunity.id, "seeded opportunity");
    }

    tracing::info!(
        organization = %organization.user.email,
        volunteer = %volunteer.user.email,
        password = DEMO_PASSWORD,
        "seed complete"
    );
    Ok(())
}

async fn account(services: &Services, name: &str, email: &str, role: Role) -> anyhow::Result<Session> {
    let registration = Registration {
        name: name.to_string(),
        email: email.to_string(),
        password: DEMO_PASSWORD.to_string(),
        role,
    };
    match services.accounts.register(registration).await {
        Ok(session) => {
            tracing::info!(%email, "created account");
            Ok(session)
        }
        Err(DomainError::Conflict(_)) => {
            tracing::info!(%email, "account exists, reusing");
            Ok(services.accounts.login(email, DEMO_PASSWORD).await?)
        }
        Err(err) => Err(err.into()),
    }
}
