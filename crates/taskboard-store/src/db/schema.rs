//! SQLite schema for the taskboard store.
//!
//! One table per collection, mirroring the entity model:
//! - `projects`, `user_stories`, `tasks` hold one row per record
//! - tag sets and the task activity log are JSON text columns; they are
//!   always read and written whole together with their owning record
//! - `store_meta` tracks the schema version and the last cleanup pass
//!
//! Timestamps are integer microseconds since the Unix epoch (`*_us`).

/// Migration v1: collection tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    project_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    tags_json TEXT NOT NULL DEFAULT '[]',
    created_at_us INTEGER NOT NULL,
    is_archived INTEGER NOT NULL DEFAULT 0 CHECK (is_archived IN (0, 1)),
    sort_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS user_stories (
    story_id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    tags_json TEXT NOT NULL DEFAULT '[]',
    created_at_us INTEGER NOT NULL,
    is_archived INTEGER NOT NULL DEFAULT 0 CHECK (is_archived IN (0, 1)),
    sort_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id TEXT PRIMARY KEY,
    user_story_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    tags_json TEXT NOT NULL DEFAULT '[]',
    status TEXT NOT NULL CHECK (status IN ('new', 'active', 'blocked', 'completed')),
    created_at_us INTEGER NOT NULL,
    start_date_us INTEGER,
    due_date_us INTEGER,
    last_updated_at_us INTEGER NOT NULL,
    completed_at_us INTEGER,
    is_blocked INTEGER NOT NULL DEFAULT 0 CHECK (is_blocked IN (0, 1)),
    blocked_at_us INTEGER,
    blocked_by TEXT NOT NULL DEFAULT '',
    blocked_reason TEXT NOT NULL DEFAULT '',
    activity_log_json TEXT NOT NULL DEFAULT '[]',
    is_archived INTEGER NOT NULL DEFAULT 0 CHECK (is_archived IN (0, 1))
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    last_cleanup_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, last_cleanup_at_us)
VALUES (1, 1, 0);
";

/// Migration v2: read-path indexes for the parent lookups and status scans.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_projects_archived_order
    ON projects(is_archived, sort_order, created_at_us);

CREATE INDEX IF NOT EXISTS idx_user_stories_project_order
    ON user_stories(project_id, sort_order, created_at_us);

CREATE INDEX IF NOT EXISTS idx_tasks_story
    ON tasks(user_story_id, created_at_us);

CREATE INDEX IF NOT EXISTS idx_tasks_status
    ON tasks(status, is_archived);

CREATE INDEX IF NOT EXISTS idx_tasks_updated
    ON tasks(last_updated_at_us DESC);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by listing and scope query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_projects_archived_order",
    "idx_user_stories_project_order",
    "idx_tasks_story",
    "idx_tasks_status",
    "idx_tasks_updated",
];

#[cfg(test)]
mod tests {
    use crate::db::migrations;
    use rusqlite::{Connection, params};

    fn seeded_conn() -> rusqlite::Result<Connection> {
        let mut conn = Connection::open_in_memory()?;
        migrations::migrate(&mut conn)?;

        for idx in 0..24_i64 {
            let status = match idx % 4 {
                0 => "new",
                1 => "active",
                2 => "blocked",
                _ => "completed",
            };
            conn.execute(
                "INSERT INTO tasks
                     (task_id, user_story_id, title, status, created_at_us, last_updated_at_us)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    format!("t-{idx:03}"),
                    format!("s-{}", idx % 3),
                    format!("Task {idx}"),
                    status,
                    idx
                ],
            )?;
        }
        Ok(conn)
    }

    fn query_plan_details(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {sql}"))?;
        stmt.query_map([], |row| row.get::<_, String>(3))?
            .collect::<Result<Vec<_>, _>>()
    }

    #[test]
    fn query_plan_uses_story_index() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let details = query_plan_details(
            &conn,
            "SELECT task_id FROM tasks WHERE user_story_id = 's-1'",
        )?;
        assert!(
            details.iter().any(|detail| detail.contains("idx_tasks_story")),
            "expected story index in plan, got: {details:?}"
        );
        Ok(())
    }

    #[test]
    fn query_plan_uses_status_index() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let details = query_plan_details(
            &conn,
            "SELECT task_id FROM tasks WHERE status = 'blocked' AND is_archived = 0",
        )?;
        assert!(
            details.iter().any(|detail| detail.contains("idx_tasks_status")),
            "expected status index in plan, got: {details:?}"
        );
        Ok(())
    }

    #[test]
    fn status_check_rejects_unknown_values() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let result = conn.execute(
            "INSERT INTO tasks
                 (task_id, user_story_id, title, status, created_at_us, last_updated_at_us)
             VALUES ('t-bad', 's-1', 'Bad', 'archived', 0, 0)",
            [],
        );
        assert!(result.is_err());
        Ok(())
    }
}
