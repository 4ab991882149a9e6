//! Postgres persistence sink backed by sqlx.
//!
//! Every operation is an `INSERT ... ON CONFLICT ... DO UPDATE` keyed by the
//! entity's natural unique key, so repeated ingestion of the same session
//! converges to identical rows. Telemetry channel arrays are stored as jsonb.
//!
//! Statements are issued inside one transaction per session, begun lazily on
//! the first upsert and committed by [`PersistenceSink::commit`]. Schema
//! creation (DDL) is owned by the deployment, not this crate.

use crate::sink::PersistenceSink;
use crate::types::{
    DriverId, DriverRecord, KeyLapTelemetry, LapPosition, LapRecord, SessionId,
    SessionRecord, SessionResultRecord, Stint, WeekendId, WeekendRecord,
};
use crate::{IngestError, Result};
use sqlx::postgres::PgPool;
use sqlx::{Postgres, Transaction};

/// A [`PersistenceSink`] writing to Postgres.
pub struct PgSink {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgSink {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool, tx: None }
    }

    /// Connect to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| IngestError::persistence_failed_with_source("connect", Box::new(e)))?;
        Ok(Self::new(pool))
    }

    async fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
        if self.tx.is_none() {
            let tx = self.pool.begin().await.map_err(|e| {
                IngestError::persistence_failed_with_source("begin transaction", Box::new(e))
            })?;
            self.tx = Some(tx);
        }
        self.tx
            .as_mut()
            .ok_or_else(|| IngestError::persistence_failed("begin transaction"))
    }
}

fn op_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> IngestError {
    move |e| IngestError::persistence_failed_with_source(operation, Box::new(e))
}

fn channel_json(channel: &Option<Vec<f64>>) -> Option<serde_json::Value> {
    channel.as_ref().map(|values| serde_json::json!(values))
}

#[async_trait::async_trait]
impl PersistenceSink for PgSink {
    async fn upsert_weekend(&mut self, weekend: &WeekendRecord) -> Result<WeekendId> {
        let tx = self.tx().await?;
        let (id,): (i64,) = sqlx::query_as(
            r#"
            insert into weekends(season, round, name, circuit, date)
            values ($1, $2, $3, $4, $5)
            on conflict (season, round) do update
              set name = excluded.name, circuit = excluded.circuit, date = excluded.date
            returning id
            "#,
        )
        .bind(weekend.season)
        .bind(weekend.round)
        .bind(&weekend.name)
        .bind(&weekend.circuit)
        .bind(weekend.date)
        .fetch_one(&mut **tx)
        .await
        .map_err(op_err("upsert_weekend"))?;
        Ok(id)
    }

    async fn upsert_session(
        &mut self,
        weekend_id: WeekendId,
        session: &SessionRecord,
    ) -> Result<SessionId> {
        let tx = self.tx().await?;
        let (id,): (i64,) = sqlx::query_as(
            r#"
            insert into sessions(weekend_id, session_code, start_time_utc)
            values ($1, $2, $3)
            on conflict (weekend_id, session_code) do update
              set start_time_utc = excluded.start_time_utc
            returning id
            "#,
        )
        .bind(weekend_id)
        .bind(&session.session_code)
        .bind(session.start_time)
        .fetch_one(&mut **tx)
        .await
        .map_err(op_err("upsert_session"))?;
        Ok(id)
    }

    async fn upsert_driver(&mut self, driver: &DriverRecord) -> Result<DriverId> {
        let tx = self.tx().await?;
        let (id,): (i64,) = sqlx::query_as(
            r#"
            insert into drivers(code, name)
            values ($1, $2)
            on conflict (code) do update set name = excluded.name
            returning id
            "#,
        )
        .bind(&driver.code)
        .bind(&driver.name)
        .fetch_one(&mut **tx)
        .await
        .map_err(op_err("upsert_driver"))?;
        Ok(id)
    }

    async fn upsert_result(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        result: &SessionResultRecord,
    ) -> Result<()> {
        let tx = self.tx().await?;
        sqlx::query(
            r#"
            insert into session_results(session_id, driver_id, position,
              best_lap_time_ms, status, points, grid)
            values ($1, $2, $3, $4, $5, $6, $7)
            on conflict (session_id, driver_id) do update set
              position = excluded.position,
              best_lap_time_ms = excluded.best_lap_time_ms,
              status = excluded.status,
              points = excluded.points,
              grid = excluded.grid
            "#,
        )
        .bind(session_id)
        .bind(driver_id)
        .bind(result.position)
        .bind(result.best_lap_time_ms)
        .bind(&result.status)
        .bind(result.points)
        .bind(result.grid)
        .execute(&mut **tx)
        .await
        .map_err(op_err("upsert_result"))?;
        Ok(())
    }

    async fn upsert_lap(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        lap: &LapRecord,
    ) -> Result<()> {
        let tx = self.tx().await?;
        sqlx::query(
            r#"
            insert into laps(session_id, driver_id, lap_number, lap_time_ms,
              compound, stint, is_personal_best)
            values ($1, $2, $3, $4, $5, $6, $7)
            on conflict (session_id, driver_id, lap_number) do update set
              lap_time_ms = excluded.lap_time_ms,
              compound = excluded.compound,
              stint = excluded.stint,
              is_personal_best = excluded.is_personal_best
            "#,
        )
        .bind(session_id)
        .bind(driver_id)
        .bind(lap.lap_number)
        .bind(lap.lap_time_ms)
        .bind(&lap.compound)
        .bind(lap.stint)
        .bind(lap.is_personal_best)
        .execute(&mut **tx)
        .await
        .map_err(op_err("upsert_lap"))?;
        Ok(())
    }

    async fn upsert_key_lap_telemetry(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        telemetry: &KeyLapTelemetry,
    ) -> Result<()> {
        let tx = self.tx().await?;
        sqlx::query(
            r#"
            insert into telemetry_keylaps(session_id, driver_id, lap_number, n_points,
              distance_m, speed_kph, throttle, brake, gear, drs, pos_x, pos_y)
            values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            on conflict (session_id, driver_id, lap_number) do update set
              n_points = excluded.n_points,
              distance_m = excluded.distance_m,
              speed_kph = excluded.speed_kph,
              throttle = excluded.throttle,
              brake = excluded.brake,
              gear = excluded.gear,
              drs = excluded.drs,
              pos_x = excluded.pos_x,
              pos_y = excluded.pos_y
            "#,
        )
        .bind(session_id)
        .bind(driver_id)
        .bind(telemetry.lap_number)
        .bind(telemetry.point_count)
        .bind(serde_json::json!(telemetry.distance))
        .bind(channel_json(&telemetry.speed))
        .bind(channel_json(&telemetry.throttle))
        .bind(channel_json(&telemetry.brake))
        .bind(channel_json(&telemetry.gear))
        .bind(channel_json(&telemetry.drs))
        .bind(channel_json(&telemetry.pos_x))
        .bind(channel_json(&telemetry.pos_y))
        .execute(&mut **tx)
        .await
        .map_err(op_err("upsert_key_lap_telemetry"))?;
        Ok(())
    }

    async fn upsert_stint(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        stint: &Stint,
    ) -> Result<()> {
        let tx = self.tx().await?;
        sqlx::query(
            r#"
            insert into stints(session_id, driver_id, stint_number, compound,
              start_lap, end_lap, tire_age_at_start)
            values ($1, $2, $3, $4, $5, $6, $7)
            on conflict (session_id, driver_id, stint_number) do update set
              compound = excluded.compound,
              start_lap = excluded.start_lap,
              end_lap = excluded.end_lap
            "#,
        )
        .bind(session_id)
        .bind(driver_id)
        .bind(stint.number)
        .bind(&stint.compound)
        .bind(stint.start_lap)
        .bind(stint.end_lap)
        .bind(stint.tire_age_at_start)
        .execute(&mut **tx)
        .await
        .map_err(op_err("upsert_stint"))?;
        Ok(())
    }

    async fn upsert_lap_position(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        position: &LapPosition,
    ) -> Result<()> {
        let tx = self.tx().await?;
        sqlx::query(
            r#"
            insert into lap_positions(session_id, lap_number, driver_id, position,
              gap_to_leader_ms, interval_ms)
            values ($1, $2, $3, $4, $5, $6)
            on conflict (session_id, lap_number, driver_id) do update set
              position = excluded.position,
              gap_to_leader_ms = excluded.gap_to_leader_ms,
              interval_ms = excluded.interval_ms
            "#,
        )
        .bind(session_id)
        .bind(position.lap_number)
        .bind(driver_id)
        .bind(position.position)
        .bind(position.gap_to_leader_ms)
        .bind(position.interval_ms)
        .execute(&mut **tx)
        .await
        .map_err(op_err("upsert_lap_position"))?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await.map_err(op_err("commit"))?;
        }
        Ok(())
    }
}

/// A [`crate::ProgressSink`] writing job progress and status to Postgres,
/// matching the `ingest_jobs` table the job scheduler reads.
pub struct PgProgress {
    pool: PgPool,
}

impl PgProgress {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl crate::sink::ProgressSink for PgProgress {
    async fn report_progress(&self, job_id: i64, session_code: &str, percent: u8) -> Result<()> {
        sqlx::query(
            r#"
            update ingest_jobs
              set progress = coalesce(progress, '{}'::jsonb)
                || jsonb_build_object($2::text, $3::int)
            where id = $1
            "#,
        )
        .bind(job_id)
        .bind(session_code)
        .bind(percent as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| IngestError::progress_failed(job_id, Box::new(e)))?;
        Ok(())
    }

    async fn set_status(&self, job_id: i64, status: crate::sink::JobStatus) -> Result<()> {
        use crate::sink::JobStatus;

        let (label, error) = match &status {
            JobStatus::Running => ("RUNNING", None),
            JobStatus::Succeeded => ("SUCCESS", None),
            JobStatus::Failed { error } => ("FAILED", Some(error.as_str())),
        };

        sqlx::query(
            r#"
            update ingest_jobs set
              status = $2,
              error = coalesce($3, error),
              started_at = case when $2 = 'RUNNING' then now() else started_at end,
              finished_at = case when $2 in ('SUCCESS', 'FAILED') then now() else finished_at end
            where id = $1
            "#,
        )
        .bind(job_id)
        .bind(label)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| IngestError::progress_failed(job_id, Box::new(e)))?;
        Ok(())
    }
}
