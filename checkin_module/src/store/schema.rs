pub(super) const CHECKIN_SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS employees (
    id TEXT PRIMARY KEY,
    name TEXT,
    email TEXT,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS checkins (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    employee_id TEXT NOT NULL REFERENCES employees(id),
    thread_id TEXT,
    first_message_id TEXT,
    reply_received_at TEXT,
    UNIQUE (date, employee_id)
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    checkin_id TEXT NOT NULL REFERENCES checkins(id),
    title TEXT NOT NULL,
    status TEXT,
    progress INTEGER,
    next_steps TEXT,
    blocker TEXT,
    observation TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_tasks_title ON tasks(title);
CREATE INDEX IF NOT EXISTS idx_tasks_checkin ON tasks(checkin_id);

CREATE TABLE IF NOT EXISTS summary (
    employee_name TEXT NOT NULL,
    task_title TEXT NOT NULL,
    status TEXT,
    observation TEXT,
    PRIMARY KEY (employee_name, task_title)
);
"#;
