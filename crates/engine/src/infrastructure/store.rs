//! Postgres catalogue store (C1). Row structs implement `sqlx::FromRow` and
//! convert into `villagemc_domain` types at this boundary, matching the
//! teacher's repository-maps-row-to-entity convention
//! (`infrastructure/persistence/*_repository.rs`): the domain crate itself
//! never depends on `sqlx`.

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::domain::{
    Channel, ChannelId, GenerationJob, Group, GroupId, JobId, JobPayload, JobStatus, JobType,
};
use crate::error::InfraError;

#[derive(Clone)]
pub struct CatalogueStore {
    pool: PgPool,
}

struct GroupRow {
    id: i64,
    external_id: String,
    guild_id: String,
    name: String,
    position: i32,
    village_index: i64,
    center_x: i32,
    center_z: i32,
    is_archived: bool,
}

impl From<GroupRow> for Group {
    fn from(r: GroupRow) -> Self {
        Group {
            id: GroupId::new(r.id),
            external_id: r.external_id,
            guild_id: r.guild_id,
            name: r.name,
            position: r.position,
            village_index: r.village_index,
            center_x: r.center_x,
            center_z: r.center_z,
            is_archived: r.is_archived,
        }
    }
}

struct ChannelRow {
    id: i64,
    external_id: String,
    group_id: i64,
    name: String,
    topic: Option<String>,
    member_count: i32,
    position: i32,
    building_index: i64,
    building_x: Option<i32>,
    building_z: Option<i32>,
    is_archived: bool,
}

impl From<ChannelRow> for Channel {
    fn from(r: ChannelRow) -> Self {
        Channel {
            id: ChannelId::new(r.id),
            external_id: r.external_id,
            group_id: GroupId::new(r.group_id),
            name: r.name,
            topic: r.topic,
            member_count: r.member_count,
            position: r.position,
            building_index: r.building_index,
            building_x: r.building_x,
            building_z: r.building_z,
            is_archived: r.is_archived,
        }
    }
}

impl CatalogueStore {
    pub async fn connect(connection_string: &str) -> Result<Self, InfraError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(connection_string)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            InfraError::config(format!("catalogue migration failed: {e}"))
        })?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert-by-`external_id` (C4.1, C4.4). A previously-archived row is
    /// reused, never re-created (Open Question resolution, DESIGN.md).
    pub async fn upsert_group(
        &self,
        external_id: &str,
        guild_id: &str,
        name: &str,
        position: i32,
    ) -> Result<(Group, bool), InfraError> {
        let mut tx = self.pool.begin().await?;

        if let Some(row) = sqlx::query_as!(
            GroupRowTmp,
            r#"SELECT id, external_id, guild_id, name, position, village_index, center_x, center_z, is_archived
               FROM groups WHERE external_id = $1 FOR UPDATE"#,
            external_id
        )
        .fetch_optional(&mut *tx)
        .await?
        {
            sqlx::query!(
                "UPDATE groups SET name = $1, position = $2 WHERE id = $3",
                name,
                position,
                row.id
            )
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
            let updated = GroupRow {
                id: row.id,
                external_id: row.external_id,
                guild_id: row.guild_id,
                name: name.to_string(),
                position,
                village_index: row.village_index,
                center_x: row.center_x,
                center_z: row.center_z,
                is_archived: row.is_archived,
            };
            return Ok((updated.into(), false));
        }

        let next_index: i64 = sqlx::query_scalar!("SELECT COALESCE(MAX(village_index), 0) + 1 FROM groups")
            .fetch_one(&mut *tx)
            .await?
            .unwrap_or(1);
        let domain_group = Group::new(external_id, guild_id, name, position, next_index);

        let row = sqlx::query!(
            r#"INSERT INTO groups (external_id, guild_id, name, position, village_index, center_x, center_z, is_archived)
               VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE)
               RETURNING id"#,
            domain_group.external_id,
            domain_group.guild_id,
            domain_group.name,
            domain_group.position,
            domain_group.village_index,
            domain_group.center_x,
            domain_group.center_z,
        )
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok((
            Group {
                id: GroupId::new(row.id),
                ..domain_group
            },
            true,
        ))
    }

    pub async fn get_group_by_external_id(&self, external_id: &str) -> Result<Option<Group>, InfraError> {
        let row = sqlx::query_as!(
            GroupRowTmp,
            r#"SELECT id, external_id, guild_id, name, position, village_index, center_x, center_z, is_archived
               FROM groups WHERE external_id = $1"#,
            external_id
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| GroupRow {
            id: r.id,
            external_id: r.external_id,
            guild_id: r.guild_id,
            name: r.name,
            position: r.position,
            village_index: r.village_index,
            center_x: r.center_x,
            center_z: r.center_z,
            is_archived: r.is_archived,
        }.into()))
    }

    pub async fn get_group_by_id(&self, id: GroupId) -> Result<Option<Group>, InfraError> {
        let row = sqlx::query_as!(
            GroupRowTmp,
            r#"SELECT id, external_id, guild_id, name, position, village_index, center_x, center_z, is_archived
               FROM groups WHERE id = $1"#,
            id.value()
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| GroupRow {
            id: r.id,
            external_id: r.external_id,
            guild_id: r.guild_id,
            name: r.name,
            position: r.position,
            village_index: r.village_index,
            center_x: r.center_x,
            center_z: r.center_z,
            is_archived: r.is_archived,
        }.into()))
    }

    /// Archives a group and cascades to every one of its non-archived
    /// channels (§3 "Relationships and ownership"). Returns the group plus
    /// the channels that were just archived (for follow-up job enqueueing).
    /// Archives a group and every non-archived child channel. Returns the
    /// group, the channels newly archived by this call, and whether the
    /// group itself was newly archived (`false` on a redelivered/duplicate
    /// `GroupDeleted` for an already-archived group), so the caller can
    /// skip enqueueing a redundant `ArchiveVillage` job (§8 idempotence).
    pub async fn archive_group(&self, external_id: &str) -> Result<Option<(Group, Vec<Channel>, bool)>, InfraError> {
        let mut tx = self.pool.begin().await?;
        let Some(row) = sqlx::query_as!(
            GroupRowTmp,
            r#"SELECT id, external_id, guild_id, name, position, village_index, center_x, center_z, is_archived
               FROM groups WHERE external_id = $1 FOR UPDATE"#,
            external_id
        )
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };
        let newly_archived = !row.is_archived;

        let channel_rows = sqlx::query_as!(
            ChannelRowTmp,
            r#"SELECT id, external_id, group_id, name, topic, member_count, position, building_index, building_x, building_z, is_archived
               FROM channels WHERE group_id = $1 AND is_archived = FALSE FOR UPDATE"#,
            row.id
        )
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query!("UPDATE groups SET is_archived = TRUE WHERE id = $1", row.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query!(
            "UPDATE channels SET is_archived = TRUE WHERE group_id = $1 AND is_archived = FALSE",
            row.id
        )
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let archived_channels: Vec<Channel> = channel_rows
            .into_iter()
            .map(|r| ChannelRow {
                id: r.id,
                external_id: r.external_id,
                group_id: r.group_id,
                name: r.name,
                topic: r.topic,
                member_count: r.member_count,
                position: r.position,
                building_index: r.building_index,
                building_x: r.building_x,
                building_z: r.building_z,
                is_archived: true,
            }.into())
            .collect();

        let group: Group = GroupRow {
            id: row.id,
            external_id: row.external_id,
            guild_id: row.guild_id,
            name: row.name,
            position: row.position,
            village_index: row.village_index,
            center_x: row.center_x,
            center_z: row.center_z,
            is_archived: true,
        }
        .into();

        Ok(Some((group, archived_channels, newly_archived)))
    }

    /// Upsert-by-`external_id` within `group_id` (C4.3). Returns the channel
    /// plus whether it was newly created (C1's `buildingIndex` assignment
    /// only happens on creation).
    pub async fn upsert_channel(
        &self,
        external_id: &str,
        group_id: GroupId,
        name: &str,
        position: i32,
        topic: Option<&str>,
        member_count: Option<i32>,
    ) -> Result<(Channel, bool), InfraError> {
        let mut tx = self.pool.begin().await?;

        if let Some(row) = sqlx::query_as!(
            ChannelRowTmp,
            r#"SELECT id, external_id, group_id, name, topic, member_count, position, building_index, building_x, building_z, is_archived
               FROM channels WHERE external_id = $1 FOR UPDATE"#,
            external_id
        )
        .fetch_optional(&mut *tx)
        .await?
        {
            sqlx::query!(
                "UPDATE channels SET name = $1, position = $2 WHERE id = $3",
                name,
                position,
                row.id
            )
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
            let updated = ChannelRow {
                id: row.id,
                external_id: row.external_id,
                group_id: row.group_id,
                name: name.to_string(),
                topic: row.topic,
                member_count: row.member_count,
                position,
                building_index: row.building_index,
                building_x: row.building_x,
                building_z: row.building_z,
                is_archived: row.is_archived,
            };
            return Ok((updated.into(), false));
        }

        let next_index: i64 = sqlx::query_scalar!(
            "SELECT COALESCE(MAX(building_index), -1) + 1 FROM channels WHERE group_id = $1 AND is_archived = FALSE",
            group_id.value()
        )
        .fetch_one(&mut *tx)
        .await?
        .unwrap_or(0);

        let mut domain_channel = Channel::new(
            external_id,
            group_id,
            name,
            position,
            next_index,
            topic.map(str::to_string),
            member_count,
        );

        let row = sqlx::query!(
            r#"INSERT INTO channels (external_id, group_id, name, topic, member_count, position, building_index, building_x, building_z, is_archived)
               VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, NULL, FALSE)
               RETURNING id"#,
            domain_channel.external_id,
            domain_channel.group_id.value(),
            domain_channel.name,
            domain_channel.topic,
            domain_channel.member_count,
            domain_channel.position,
            domain_channel.building_index,
        )
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        domain_channel.id = ChannelId::new(row.id);
        Ok((domain_channel, true))
    }

    pub async fn set_channel_building_coords(
        &self,
        channel_id: ChannelId,
        x: i32,
        z: i32,
    ) -> Result<(), InfraError> {
        sqlx::query!(
            "UPDATE channels SET building_x = $1, building_z = $2 WHERE id = $3",
            x,
            z,
            channel_id.value()
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_channel_name(&self, channel_id: ChannelId, name: &str) -> Result<(), InfraError> {
        sqlx::query!("UPDATE channels SET name = $1 WHERE id = $2", name, channel_id.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_channel_topic(
        &self,
        channel_id: ChannelId,
        topic: Option<&str>,
    ) -> Result<(), InfraError> {
        sqlx::query!("UPDATE channels SET topic = $1 WHERE id = $2", topic, channel_id.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_channel_by_external_id(&self, external_id: &str) -> Result<Option<Channel>, InfraError> {
        let row = sqlx::query_as!(
            ChannelRowTmp,
            r#"SELECT id, external_id, group_id, name, topic, member_count, position, building_index, building_x, building_z, is_archived
               FROM channels WHERE external_id = $1"#,
            external_id
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::<ChannelRow>::into).map(Into::into))
    }

    pub async fn get_channel_by_id(&self, id: ChannelId) -> Result<Option<Channel>, InfraError> {
        let row = sqlx::query_as!(
            ChannelRowTmp,
            r#"SELECT id, external_id, group_id, name, topic, member_count, position, building_index, building_x, building_z, is_archived
               FROM channels WHERE id = $1"#,
            id.value()
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::<ChannelRow>::into).map(Into::into))
    }

    /// Archives a channel by external id. Returns the channel plus whether
    /// this call newly archived it (`false` on a redelivered/duplicate
    /// `ChannelDeleted` for an already-archived channel) so the caller can
    /// skip enqueueing a redundant `ArchiveBuilding` job (§8 idempotence).
    pub async fn archive_channel(&self, external_id: &str) -> Result<Option<(Channel, bool)>, InfraError> {
        let mut tx = self.pool.begin().await?;
        let Some(row) = sqlx::query_as!(
            ChannelRowTmp,
            r#"SELECT id, external_id, group_id, name, topic, member_count, position, building_index, building_x, building_z, is_archived
               FROM channels WHERE external_id = $1 FOR UPDATE"#,
            external_id
        )
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };
        if row.is_archived {
            tx.commit().await?;
            return Ok(Some((Into::<ChannelRow>::into(row).into(), false)));
        }
        sqlx::query!("UPDATE channels SET is_archived = TRUE WHERE id = $1", row.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        let archived = ChannelRow {
            is_archived: true,
            ..Into::<ChannelRow>::into(row)
        };
        Ok(Some((archived.into(), true)))
    }

    pub async fn list_groups(&self) -> Result<Vec<(Group, i64)>, InfraError> {
        let rows = sqlx::query(
            r#"SELECT g.id, g.external_id, g.guild_id, g.name, g.position, g.village_index, g.center_x, g.center_z, g.is_archived,
                      COUNT(c.id) FILTER (WHERE c.is_archived = FALSE) AS building_count
               FROM groups g LEFT JOIN channels c ON c.group_id = g.id
               WHERE g.is_archived = FALSE
               GROUP BY g.id ORDER BY g.position"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let group: Group = GroupRow {
                    id: r.get("id"),
                    external_id: r.get("external_id"),
                    guild_id: r.get("guild_id"),
                    name: r.get("name"),
                    position: r.get("position"),
                    village_index: r.get("village_index"),
                    center_x: r.get("center_x"),
                    center_z: r.get("center_z"),
                    is_archived: r.get("is_archived"),
                }
                .into();
                let count: i64 = r.get("building_count");
                (group, count)
            })
            .collect())
    }

    pub async fn list_channels_for_group(&self, group_id: GroupId) -> Result<Vec<Channel>, InfraError> {
        let rows = sqlx::query_as!(
            ChannelRowTmp,
            r#"SELECT id, external_id, group_id, name, topic, member_count, position, building_index, building_x, building_z, is_archived
               FROM channels WHERE group_id = $1 ORDER BY building_index"#,
            group_id.value()
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| Into::<ChannelRow>::into(r).into()).collect())
    }

    /// Case-insensitive substring search, top 10 non-archived, shortest name
    /// first (§4.11 `/api/buildings/search`).
    pub async fn search_channels(&self, query: &str) -> Result<Vec<Channel>, InfraError> {
        let pattern = format!("%{}%", query.to_lowercase());
        let rows = sqlx::query_as!(
            ChannelRowTmp,
            r#"SELECT id, external_id, group_id, name, topic, member_count, position, building_index, building_x, building_z, is_archived
               FROM channels
               WHERE is_archived = FALSE AND LOWER(name) LIKE $1
               ORDER BY LENGTH(name) ASC
               LIMIT 10"#,
            pattern
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| Into::<ChannelRow>::into(r).into()).collect())
    }

    pub async fn status(&self) -> Result<(i64, i64), InfraError> {
        let villages: i64 = sqlx::query_scalar!("SELECT COUNT(*) FROM groups WHERE is_archived = FALSE")
            .fetch_one(&self.pool)
            .await?
            .unwrap_or(0);
        let buildings: i64 = sqlx::query_scalar!("SELECT COUNT(*) FROM channels WHERE is_archived = FALSE")
            .fetch_one(&self.pool)
            .await?
            .unwrap_or(0);
        Ok((villages, buildings))
    }

    pub async fn insert_job(&self, job: &GenerationJob) -> Result<(), InfraError> {
        let payload = serde_json::to_value(&job.payload)?;
        sqlx::query!(
            r#"INSERT INTO generation_jobs (id, job_type, payload, status, attempts, last_error, created_at, completed_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
            job.id.as_uuid(),
            job_type_str(job.job_type),
            payload,
            job_status_str(job.status),
            job.attempts,
            job.last_error,
            job.created_at,
            job.completed_at,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_job_attempts(&self, job_id: JobId) -> Result<Option<i32>, InfraError> {
        let row = sqlx::query!("SELECT attempts FROM generation_jobs WHERE id = $1", job_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.attempts))
    }

    pub async fn mark_in_progress(&self, job_id: JobId) -> Result<(), InfraError> {
        sqlx::query!(
            "UPDATE generation_jobs SET status = 'InProgress', attempts = attempts + 1 WHERE id = $1",
            job_id.as_uuid()
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_completed(&self, job_id: JobId, completed_at: DateTime<Utc>) -> Result<(), InfraError> {
        sqlx::query!(
            "UPDATE generation_jobs SET status = 'Completed', completed_at = $2 WHERE id = $1",
            job_id.as_uuid(),
            completed_at
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(&self, job_id: JobId, last_error: &str) -> Result<(), InfraError> {
        sqlx::query!(
            "UPDATE generation_jobs SET status = 'Failed', last_error = $2 WHERE id = $1",
            job_id.as_uuid(),
            last_error
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_pending_with_error(&self, job_id: JobId, last_error: &str) -> Result<(), InfraError> {
        sqlx::query!(
            "UPDATE generation_jobs SET status = 'Pending', last_error = $2 WHERE id = $1",
            job_id.as_uuid(),
            last_error
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Startup reconciliation (§7 "Dangling InProgress"): any row still
    /// `InProgress` belonged to a worker that died mid-job. Reset to
    /// `Pending` and hand back each job's id and payload so the caller can
    /// rebuild a `JobEnvelope` and re-enqueue it onto `queue:worldgen`.
    pub async fn reset_dangling_in_progress(&self) -> Result<Vec<(JobId, JobPayload)>, InfraError> {
        let rows = sqlx::query!("SELECT id, payload FROM generation_jobs WHERE status = 'InProgress'")
            .fetch_all(&self.pool)
            .await?;
        sqlx::query!("UPDATE generation_jobs SET status = 'Pending' WHERE status = 'InProgress'")
            .execute(&self.pool)
            .await?;
        rows.into_iter()
            .map(|r| Ok((JobId::from_uuid(r.id), serde_json::from_value(r.payload)?)))
            .collect()
    }

    pub async fn crossroads_completed(&self) -> Result<bool, InfraError> {
        let count: i64 = sqlx::query_scalar!(
            "SELECT COUNT(*) FROM generation_jobs WHERE job_type = 'CreateCrossroads' AND status = 'Completed'"
        )
        .fetch_one(&self.pool)
        .await?
        .unwrap_or(0);
        Ok(count > 0)
    }
}

fn job_type_str(t: JobType) -> &'static str {
    match t {
        JobType::CreateVillage => "CreateVillage",
        JobType::CreateBuilding => "CreateBuilding",
        JobType::UpdateBuilding => "UpdateBuilding",
        JobType::ArchiveBuilding => "ArchiveBuilding",
        JobType::ArchiveVillage => "ArchiveVillage",
        JobType::CreateTrack => "CreateTrack",
        JobType::CreateCrossroads => "CreateCrossroads",
    }
}

fn job_status_str(s: JobStatus) -> &'static str {
    match s {
        JobStatus::Pending => "Pending",
        JobStatus::InProgress => "InProgress",
        JobStatus::Completed => "Completed",
        JobStatus::Failed => "Failed",
    }
}

// sqlx::query_as! macro-generated anonymous structs need a named type to
// bind to; these mirror the SELECT column lists exactly.
struct GroupRowTmp {
    id: i64,
    external_id: String,
    guild_id: String,
    name: String,
    position: i32,
    village_index: i64,
    center_x: i32,
    center_z: i32,
    is_archived: bool,
}

struct ChannelRowTmp {
    id: i64,
    external_id: String,
    group_id: i64,
    name: String,
    topic: Option<String>,
    member_count: i32,
    position: i32,
    building_index: i64,
    building_x: Option<i32>,
    building_z: Option<i32>,
    is_archived: bool,
}

impl From<ChannelRowTmp> for ChannelRow {
    fn from(r: ChannelRowTmp) -> Self {
        ChannelRow {
            id: r.id,
            external_id: r.external_id,
            group_id: r.group_id,
            name: r.name,
            topic: r.topic,
            member_count: r.member_count,
            position: r.position,
            building_index: r.building_index,
            building_x: r.building_x,
            building_z: r.building_z,
            is_archived: r.is_archived,
        }
    }
}
