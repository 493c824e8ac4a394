//! # Postgres store
//!
//! This module implements the data mapping between the Postgres relational
//! model and the `domains` models. Enumerations are stored as TEXT and parsed
//! back on read.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    Application, ApplicationRepo, ApplicationView, Credentials, DomainError, Message, MessageRepo,
    Notification, NotificationRepo, Opportunity, OpportunityRepo, ProfileUpdate, Rating,
    RatingRepo, Result, User, UserRepo,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(db_err)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Explains a guarded UPDATE that matched no row.
    async fn lost_race(&self, id: Uuid, reason: &str) -> DomainError {
        let exists: std::result::Result<bool, sqlx::Error> =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM applications WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await;
        match exists {
            Ok(true) => DomainError::PreconditionFailed(reason.to_string()),
            Ok(false) => DomainError::not_found("Application", id),
            Err(err) => db_err(err),
        }
    }

    /// Applies the bundled migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(DomainError::internal)?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

/// Unique violations become `Conflict`; everything else is logged and hidden.
fn db_err(err: sqlx::Error) -> DomainError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            return DomainError::Conflict(db.message().to_string());
        }
    }
    tracing::error!(error = %err, "database error");
    DomainError::internal(err)
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    skills: Option<String>,
    availability: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role.parse()?,
            skills: row.skills,
            availability: row.availability,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(FromRow)]
struct OpportunityRow {
    id: Uuid,
    organization_id: Uuid,
    title: String,
    description: String,
    location: String,
    date: String,
    created_at: DateTime<Utc>,
}

impl From<OpportunityRow> for Opportunity {
    fn from(row: OpportunityRow) -> Self {
        Opportunity {
            id: row.id,
            organization_id: row.organization_id,
            title: row.title,
            description: row.description,
            location: row.location,
            date: row.date,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ApplicationRow {
    id: Uuid,
    opportunity_id: Uuid,
    volunteer_id: Uuid,
    status: String,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = DomainError;

    fn try_from(row: ApplicationRow) -> Result<Self> {
        Ok(Application {
            id: row.id,
            opportunity_id: row.opportunity_id,
            volunteer_id: row.volunteer_id,
            status: row.status.parse()?,
            completed: row.completed,
            completed_at: row.completed_at,
            feedback: row.feedback,
            created_at: row.created_at,
        })
    }
}

/// One row of an application joined with its opportunity and, for
/// organization listings, the applicant.
#[derive(FromRow)]
struct ApplicationViewRow {
    #[sqlx(flatten)]
    application: ApplicationRow,
    organization_id: Uuid,
    title: String,
    description: String,
    location: String,
    date: String,
    opportunity_created_at: DateTime<Utc>,
    volunteer_name: Option<String>,
    volunteer_email: Option<String>,
    volunteer_role: Option<String>,
    volunteer_skills: Option<String>,
    volunteer_availability: Option<String>,
    volunteer_created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ApplicationViewRow> for ApplicationView {
    type Error = DomainError;

    fn try_from(row: ApplicationViewRow) -> Result<Self> {
        let volunteer = match (row.volunteer_name, row.volunteer_email, row.volunteer_role, row.volunteer_created_at) {
            (Some(name), Some(email), Some(role), Some(created_at)) => Some(User {
                id: row.application.volunteer_id,
                name,
                email,
                role: role.parse()?,
                skills: row.volunteer_skills,
                availability: row.volunteer_availability,
                created_at,
            }),
            _ => None,
        };
        let opportunity = Opportunity {
            id: row.application.opportunity_id,
            organization_id: row.organization_id,
            title: row.title,
            description: row.description,
            location: row.location,
            date: row.date,
            created_at: row.opportunity_created_at,
        };
        Ok(ApplicationView {
            application: row.application.try_into()?,
            opportunity,
            volunteer,
        })
    }
}

const APPLICATION_COLUMNS: &str =
    "a.id, a.opportunity_id, a.volunteer_id, a.status, a.completed, a.completed_at, a.feedback, a.created_at";

const OPPORTUNITY_COLUMNS: &str = "o.organization_id, o.title, o.description, o.location, o.date, \
     o.created_at AS opportunity_created_at";

#[async_trait]
impl UserRepo for PgStore {
    async fn create_user(&self, user: User, password_hash: String) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role, password_hash, skills, availability, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(password_hash)
        .bind(&user.skills)
        .bind(&user.availability)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match db_err(err) {
            DomainError::Conflict(_) => DomainError::Conflict("email already registered".to_string()),
            other => other,
        })?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, role, skills, availability, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(User::try_from)
        .transpose()
    }

    async fn get_credentials(&self, email: String) -> Result<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, name, email, role, skills, availability, created_at, password_hash \
             FROM users WHERE email = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => Ok(Some(Credentials {
                user: row.user.try_into()?,
                password_hash: row.password_hash,
            })),
            None => Ok(None),
        }
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "UPDATE users SET skills = $2, availability = $3 WHERE id = $1 \
             RETURNING id, name, email, role, skills, availability, created_at",
        )
        .bind(id)
        .bind(update.skills)
        .bind(update.availability)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(User::try_from)
        .transpose()
    }
}

#[async_trait]
impl OpportunityRepo for PgStore {
    async fn create_opportunity(&self, opportunity: Opportunity) -> Result<()> {
        sqlx::query(
            "INSERT INTO opportunities (id, organization_id, title, description, location, date, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(opportunity.id)
        .bind(opportunity.organization_id)
        .bind(opportunity.title)
        .bind(opportunity.description)
        .bind(opportunity.location)
        .bind(opportunity.date)
        .bind(opportunity.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_opportunity(&self, id: Uuid) -> Result<Option<Opportunity>> {
        let row = sqlx::query_as::<_, OpportunityRow>("SELECT * FROM opportunities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Opportunity::from))
    }

    async fn list_opportunities(&self) -> Result<Vec<Opportunity>> {
        let rows = sqlx::query_as::<_, OpportunityRow>(
            "SELECT * FROM opportunities ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(Opportunity::from).collect())
    }

    async fn count_by_organization(&self, organization_id: Uuid) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM opportunities WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count(n))
    }
}

#[async_trait]
impl ApplicationRepo for PgStore {
    async fn insert_application(&self, application: Application) -> Result<()> {
        let inserted = sqlx::query(
            "INSERT INTO applications (id, opportunity_id, volunteer_id, status, completed, completed_at, feedback, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (volunteer_id, opportunity_id) DO NOTHING",
        )
        .bind(application.id)
        .bind(application.opportunity_id)
        .bind(application.volunteer_id)
        .bind(application.status.as_str())
        .bind(application.completed)
        .bind(application.completed_at)
        .bind(application.feedback)
        .bind(application.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if inserted.rows_affected() == 0 {
            return Err(DomainError::Conflict("Already applied".to_string()));
        }
        Ok(())
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
        sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(Application::try_from)
            .transpose()
    }

    async fn decide_application(&self, application: Application) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE applications SET status = $2 WHERE id = $1 AND status = 'pending'",
        )
        .bind(application.id)
        .bind(application.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if updated.rows_affected() == 0 {
            return Err(self.lost_race(application.id, "application is no longer pending").await);
        }
        Ok(())
    }

    /// Completion and its rating land in one transaction, so a recorded
    /// outcome never lacks its ledger entry. The guarded UPDATE makes a
    /// second completion a no-op that rolls back.
    async fn complete_application(&self, application: Application, rating: Rating) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let updated = sqlx::query(
            "UPDATE applications SET completed = $2, completed_at = $3, feedback = $4 \
             WHERE id = $1 AND status = 'approved' AND completed_at IS NULL",
        )
        .bind(application.id)
        .bind(application.completed)
        .bind(application.completed_at)
        .bind(&application.feedback)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(db_err)?;
            let reason = "application is not approved or already completed";
            return Err(self.lost_race(application.id, reason).await);
        }

        insert_rating(&mut *tx, &rating).await?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn list_by_volunteer(&self, volunteer_id: Uuid) -> Result<Vec<ApplicationView>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS}, {OPPORTUNITY_COLUMNS}, \
                 NULL::text AS volunteer_name, NULL::text AS volunteer_email, NULL::text AS volunteer_role, \
                 NULL::text AS volunteer_skills, NULL::text AS volunteer_availability, \
                 NULL::timestamptz AS volunteer_created_at \
             FROM applications a \
             JOIN opportunities o ON o.id = a.opportunity_id \
             WHERE a.volunteer_id = $1 \
             ORDER BY a.created_at DESC, a.id DESC"
        );
        let rows = sqlx::query_as::<_, ApplicationViewRow>(&sql)
            .bind(volunteer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(ApplicationView::try_from).collect()
    }

    async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<ApplicationView>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS}, {OPPORTUNITY_COLUMNS}, \
                 u.name AS volunteer_name, u.email AS volunteer_email, u.role AS volunteer_role, \
                 u.skills AS volunteer_skills, u.availability AS volunteer_availability, \
                 u.created_at AS volunteer_created_at \
             FROM applications a \
             JOIN opportunities o ON o.id = a.opportunity_id \
             LEFT JOIN users u ON u.id = a.volunteer_id \
             WHERE o.organization_id = $1 \
             ORDER BY a.created_at DESC, a.id DESC"
        );
        let rows = sqlx::query_as::<_, ApplicationViewRow>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(ApplicationView::try_from).collect()
    }

    async fn count_by_volunteer(&self, volunteer_id: Uuid) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE volunteer_id = $1")
            .bind(volunteer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count(n))
    }

    async fn count_completed_by_organization(&self, organization_id: Uuid) -> Result<u64> {
        let n: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications a \
             JOIN opportunities o ON o.id = a.opportunity_id \
             WHERE o.organization_id = $1 AND a.completed",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(count(n))
    }

    async fn completion_dates(&self, volunteer_id: Uuid) -> Result<Vec<DateTime<Utc>>> {
        sqlx::query_scalar(
            "SELECT completed_at FROM applications \
             WHERE volunteer_id = $1 AND completed AND completed_at IS NOT NULL",
        )
        .bind(volunteer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }
}

async fn insert_rating<'e, E>(executor: E, rating: &Rating) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        "INSERT INTO ratings (id, application_id, volunteer_id, organization_id, rating, feedback, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(rating.id)
    .bind(rating.application_id)
    .bind(rating.volunteer_id)
    .bind(rating.organization_id)
    .bind(rating.rating)
    .bind(&rating.feedback)
    .bind(rating.created_at)
    .execute(executor)
    .await
    .map_err(db_err)?;
    Ok(())
}

#[async_trait]
impl RatingRepo for PgStore {
    async fn append_rating(&self, rating: Rating) -> Result<()> {
        insert_rating(&self.pool, &rating).await
    }

    async fn ratings_for_volunteer(&self, volunteer_id: Uuid) -> Result<Vec<i32>> {
        sqlx::query_scalar("SELECT rating FROM ratings WHERE volunteer_id = $1")
            .bind(volunteer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl NotificationRepo for PgStore {
    async fn insert_notification(&self, notification: Notification) -> Result<()> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, message, is_read, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.message)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let rows: Vec<(Uuid, Uuid, String, bool, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, user_id, message, is_read, created_at FROM notifications \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, user_id, message, is_read, created_at)| Notification {
                id,
                user_id,
                message,
                is_read,
                created_at,
            })
            .collect())
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let updated = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(updated.rows_affected() > 0)
    }
}

#[async_trait]
impl MessageRepo for PgStore {
    async fn insert_message(&self, message: Message) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (id, sender_id, receiver_id, content, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(message.id)
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(message.content)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn conversation(&self, user_id: Uuid, peer_id: Uuid) -> Result<Vec<Message>> {
        let rows: Vec<(Uuid, Uuid, Uuid, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, sender_id, receiver_id, content, created_at FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .bind(peer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, sender_id, receiver_id, content, created_at)| Message {
                id,
                sender_id,
                receiver_id,
                content,
                created_at,
            })
            .collect())
    }
}
