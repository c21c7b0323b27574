//! SQLite schema definitions and SQL query constants.
//!
//! Child collections (ticket images, intervention materials, expenses and
//! images, procedure images and attachments) are stored as JSON columns on
//! their parent row. Tags and relations use join tables.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    phone TEXT,
    user_type TEXT NOT NULL,
    avatar TEXT,
    bio TEXT,
    email_verified INTEGER NOT NULL,
    is_superuser INTEGER NOT NULL,
    is_active INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS clients (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL UNIQUE,
    company TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS technicians (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL UNIQUE,
    specialty TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS tickets (
    id TEXT PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    material_name TEXT,
    problem_start_date TEXT,
    problem_type TEXT,
    status TEXT NOT NULL,
    priority TEXT NOT NULL,
    tags TEXT,
    attachment TEXT,
    client_id TEXT NOT NULL,
    technician_id TEXT,
    images TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (client_id) REFERENCES clients(id) ON DELETE CASCADE,
    FOREIGN KEY (technician_id) REFERENCES technicians(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS interventions (
    id TEXT PRIMARY KEY,
    ticket_id TEXT NOT NULL,
    technician_id TEXT,
    code TEXT NOT NULL UNIQUE,
    report TEXT NOT NULL,
    intervention_date TEXT NOT NULL,
    start_time TEXT,
    end_time TEXT,
    transport_cost TEXT NOT NULL,
    additional_costs TEXT NOT NULL,
    total_cost TEXT NOT NULL,
    hours_worked TEXT NOT NULL,
    travel_time TEXT NOT NULL,
    materials_used TEXT,
    equipment_used TEXT,
    status TEXT NOT NULL,
    customer_signature TEXT,
    customer_feedback TEXT,
    customer_rating INTEGER,
    technician_notes TEXT,
    internal_notes TEXT,
    materials TEXT NOT NULL,
    expenses TEXT NOT NULL,
    images TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (ticket_id) REFERENCES tickets(id) ON DELETE CASCADE,
    FOREIGN KEY (technician_id) REFERENCES technicians(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    ticket_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    content TEXT,
    image TEXT,
    timestamp TEXT NOT NULL,
    whatsapp_status TEXT NOT NULL,
    whatsapp_sid TEXT,
    is_whatsapp INTEGER NOT NULL,
    FOREIGN KEY (ticket_id) REFERENCES tickets(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS technician_ratings (
    id TEXT PRIMARY KEY,
    technician_id TEXT NOT NULL,
    client_id TEXT NOT NULL,
    rating INTEGER NOT NULL,
    comment TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (technician_id, client_id),
    FOREIGN KEY (technician_id) REFERENCES technicians(id) ON DELETE CASCADE,
    FOREIGN KEY (client_id) REFERENCES clients(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS client_ratings (
    id TEXT PRIMARY KEY,
    client_id TEXT NOT NULL,
    technician_id TEXT NOT NULL,
    rating INTEGER NOT NULL,
    comment TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (client_id, technician_id),
    FOREIGN KEY (client_id) REFERENCES clients(id) ON DELETE CASCADE,
    FOREIGN KEY (technician_id) REFERENCES technicians(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS procedures (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    content TEXT NOT NULL,
    category TEXT NOT NULL,
    difficulty TEXT NOT NULL,
    estimated_time TEXT NOT NULL,
    is_active INTEGER NOT NULL,
    author_id TEXT,
    views INTEGER NOT NULL,
    likes INTEGER NOT NULL,
    bookmarks INTEGER NOT NULL,
    status TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    meta_description TEXT NOT NULL,
    featured INTEGER NOT NULL,
    images TEXT NOT NULL,
    attachments TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS procedure_tags (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    slug TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    color TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS procedure_tag_links (
    procedure_id TEXT NOT NULL,
    tag_id TEXT NOT NULL,
    PRIMARY KEY (procedure_id, tag_id),
    FOREIGN KEY (procedure_id) REFERENCES procedures(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES procedure_tags(id) ON DELETE CASCADE
);

-- Symmetric relation, stored once with low_id < high_id.
CREATE TABLE IF NOT EXISTS procedure_relations (
    low_id TEXT NOT NULL,
    high_id TEXT NOT NULL,
    PRIMARY KEY (low_id, high_id),
    FOREIGN KEY (low_id) REFERENCES procedures(id) ON DELETE CASCADE,
    FOREIGN KEY (high_id) REFERENCES procedures(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS procedure_interactions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    procedure_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (user_id, procedure_id, kind),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (procedure_id) REFERENCES procedures(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    ticket_id TEXT,
    is_read INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (ticket_id) REFERENCES tickets(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_tickets_client_id ON tickets(client_id);
CREATE INDEX IF NOT EXISTS idx_tickets_technician_id ON tickets(technician_id);
CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets(created_at);
CREATE INDEX IF NOT EXISTS idx_interventions_ticket_id ON interventions(ticket_id);
CREATE INDEX IF NOT EXISTS idx_messages_ticket_id ON messages(ticket_id);
CREATE INDEX IF NOT EXISTS idx_notifications_user_id ON notifications(user_id);
"#;

// User queries
macro_rules! user_columns {
    () => {
        "id, username, first_name, last_name, email, phone, user_type, avatar, bio, email_verified, is_superuser, is_active, created_at, updated_at"
    };
}

pub const INSERT_USER: &str = r#"
INSERT INTO users (id, username, first_name, last_name, email, phone, user_type, avatar, bio, email_verified, is_superuser, is_active, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
"#;

pub const SELECT_USER_BY_ID: &str = concat!(
    "SELECT ",
    user_columns!(),
    " FROM users WHERE id = ?1"
);

pub const SELECT_USER_BY_EMAIL: &str = concat!(
    "SELECT ",
    user_columns!(),
    " FROM users WHERE email = ?1 COLLATE NOCASE"
);

pub const SELECT_ALL_USERS: &str = concat!(
    "SELECT ",
    user_columns!(),
    " FROM users ORDER BY created_at ASC"
);

pub const UPDATE_USER: &str = r#"
UPDATE users
SET username = ?2, first_name = ?3, last_name = ?4, email = ?5, phone = ?6, user_type = ?7,
    avatar = ?8, bio = ?9, email_verified = ?10, is_superuser = ?11, is_active = ?12, updated_at = ?13
WHERE id = ?1
"#;

pub const DELETE_USER: &str = "DELETE FROM users WHERE id = ?1";

// Profile queries
pub const INSERT_CLIENT: &str =
    "INSERT INTO clients (id, user_id, company, created_at) VALUES (?1, ?2, ?3, ?4)";
pub const SELECT_CLIENT_BY_ID: &str =
    "SELECT id, user_id, company, created_at FROM clients WHERE id = ?1";
pub const SELECT_CLIENT_BY_USER: &str =
    "SELECT id, user_id, company, created_at FROM clients WHERE user_id = ?1";
pub const SELECT_ALL_CLIENTS: &str =
    "SELECT id, user_id, company, created_at FROM clients ORDER BY created_at ASC";
pub const UPDATE_CLIENT: &str = "UPDATE clients SET company = ?2 WHERE id = ?1";
pub const DELETE_CLIENT: &str = "DELETE FROM clients WHERE id = ?1";

pub const INSERT_TECHNICIAN: &str =
    "INSERT INTO technicians (id, user_id, specialty, created_at) VALUES (?1, ?2, ?3, ?4)";
pub const SELECT_TECHNICIAN_BY_ID: &str =
    "SELECT id, user_id, specialty, created_at FROM technicians WHERE id = ?1";
pub const SELECT_TECHNICIAN_BY_USER: &str =
    "SELECT id, user_id, specialty, created_at FROM technicians WHERE user_id = ?1";
pub const SELECT_ALL_TECHNICIANS: &str =
    "SELECT id, user_id, specialty, created_at FROM technicians ORDER BY created_at ASC";
pub const UPDATE_TECHNICIAN: &str = "UPDATE technicians SET specialty = ?2 WHERE id = ?1";
pub const DELETE_TECHNICIAN: &str = "DELETE FROM technicians WHERE id = ?1";

// Ticket queries
macro_rules! ticket_columns {
    () => {
        "id, code, title, description, material_name, problem_start_date, problem_type, status, priority, tags, attachment, client_id, technician_id, images, created_at, updated_at"
    };
}

pub const INSERT_TICKET: &str = r#"
INSERT INTO tickets (id, code, title, description, material_name, problem_start_date, problem_type, status, priority, tags, attachment, client_id, technician_id, images, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
"#;

pub const SELECT_TICKET_BY_ID: &str = concat!(
    "SELECT ",
    ticket_columns!(),
    " FROM tickets WHERE id = ?1"
);

/// Filtering happens in Rust against `TicketFilter`.
pub const SELECT_ALL_TICKETS: &str = concat!(
    "SELECT ",
    ticket_columns!(),
    " FROM tickets ORDER BY created_at DESC"
);

pub const SELECT_LATEST_TICKET_CODE: &str = r#"
SELECT code FROM tickets
WHERE code LIKE ?1
ORDER BY created_at DESC, code DESC
LIMIT 1
"#;

/// `code` is deliberately absent: it never changes after creation.
pub const UPDATE_TICKET: &str = r#"
UPDATE tickets
SET title = ?2, description = ?3, material_name = ?4, problem_start_date = ?5, problem_type = ?6,
    status = ?7, priority = ?8, tags = ?9, attachment = ?10, client_id = ?11, technician_id = ?12,
    images = ?13, updated_at = ?14
WHERE id = ?1
"#;

pub const DELETE_TICKET: &str = "DELETE FROM tickets WHERE id = ?1";

// Intervention queries
macro_rules! intervention_columns {
    () => {
        "id, ticket_id, technician_id, code, report, intervention_date, start_time, end_time, transport_cost, additional_costs, total_cost, hours_worked, travel_time, materials_used, equipment_used, status, customer_signature, customer_feedback, customer_rating, technician_notes, internal_notes, materials, expenses, images, created_at, updated_at"
    };
}

pub const INSERT_INTERVENTION: &str = r#"
INSERT INTO interventions (id, ticket_id, technician_id, code, report, intervention_date, start_time, end_time, transport_cost, additional_costs, total_cost, hours_worked, travel_time, materials_used, equipment_used, status, customer_signature, customer_feedback, customer_rating, technician_notes, internal_notes, materials, expenses, images, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)
"#;

pub const SELECT_INTERVENTION_BY_ID: &str = concat!(
    "SELECT ",
    intervention_columns!(),
    " FROM interventions WHERE id = ?1"
);

pub const SELECT_ALL_INTERVENTIONS: &str = concat!(
    "SELECT ",
    intervention_columns!(),
    " FROM interventions ORDER BY intervention_date DESC, created_at DESC"
);

pub const SELECT_INTERVENTIONS_BY_TICKET: &str = concat!(
    "SELECT ",
    intervention_columns!(),
    " FROM interventions WHERE ticket_id = ?1 ORDER BY intervention_date DESC, created_at DESC"
);

/// `code` is deliberately absent: it never changes after creation.
pub const UPDATE_INTERVENTION: &str = r#"
UPDATE interventions
SET ticket_id = ?2, technician_id = ?3, report = ?4, intervention_date = ?5, start_time = ?6,
    end_time = ?7, transport_cost = ?8, additional_costs = ?9, total_cost = ?10, hours_worked = ?11,
    travel_time = ?12, materials_used = ?13, equipment_used = ?14, status = ?15,
    customer_signature = ?16, customer_feedback = ?17, customer_rating = ?18,
    technician_notes = ?19, internal_notes = ?20, materials = ?21, expenses = ?22, images = ?23,
    updated_at = ?24
WHERE id = ?1
"#;

pub const DELETE_INTERVENTION: &str = "DELETE FROM interventions WHERE id = ?1";

// Message queries
pub const INSERT_MESSAGE: &str = r#"
INSERT INTO messages (id, ticket_id, user_id, content, image, timestamp, whatsapp_status, whatsapp_sid, is_whatsapp)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;

pub const SELECT_MESSAGES_BY_TICKET: &str = r#"
SELECT id, ticket_id, user_id, content, image, timestamp, whatsapp_status, whatsapp_sid, is_whatsapp
FROM messages
WHERE ticket_id = ?1
ORDER BY timestamp ASC
"#;

// Rating queries
pub const INSERT_TECHNICIAN_RATING: &str = r#"
INSERT INTO technician_ratings (id, technician_id, client_id, rating, comment, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub const SELECT_TECHNICIAN_RATINGS: &str = r#"
SELECT id, technician_id, client_id, rating, comment, created_at
FROM technician_ratings
WHERE technician_id = ?1
ORDER BY created_at DESC
"#;

pub const INSERT_CLIENT_RATING: &str = r#"
INSERT INTO client_ratings (id, client_id, technician_id, rating, comment, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub const SELECT_CLIENT_RATINGS: &str = r#"
SELECT id, client_id, technician_id, rating, comment, created_at
FROM client_ratings
WHERE client_id = ?1
ORDER BY created_at DESC
"#;

// Procedure queries
macro_rules! procedure_columns {
    () => {
        "id, title, description, content, category, difficulty, estimated_time, is_active, author_id, views, likes, bookmarks, status, slug, meta_description, featured, images, attachments, created_at, updated_at"
    };
}

pub const INSERT_PROCEDURE: &str = r#"
INSERT INTO procedures (id, title, description, content, category, difficulty, estimated_time, is_active, author_id, views, likes, bookmarks, status, slug, meta_description, featured, images, attachments, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
"#;

pub const SELECT_PROCEDURE_BY_ID: &str = concat!(
    "SELECT ",
    procedure_columns!(),
    " FROM procedures WHERE id = ?1"
);

pub const SELECT_PROCEDURE_BY_SLUG: &str = concat!(
    "SELECT ",
    procedure_columns!(),
    " FROM procedures WHERE slug = ?1"
);

pub const SELECT_ALL_PROCEDURES: &str = concat!(
    "SELECT ",
    procedure_columns!(),
    " FROM procedures ORDER BY featured DESC, created_at DESC"
);

pub const SELECT_RELATED_PROCEDURES: &str = concat!(
    "SELECT ",
    procedure_columns!(),
    " FROM procedures WHERE id IN (
            SELECT high_id FROM procedure_relations WHERE low_id = ?1
            UNION
            SELECT low_id FROM procedure_relations WHERE high_id = ?1
        ) ORDER BY title ASC"
);

pub const SELECT_SLUGS_WITH_PREFIX: &str =
    "SELECT slug FROM procedures WHERE substr(slug, 1, length(?1)) = ?1";

pub const UPDATE_PROCEDURE: &str = r#"
UPDATE procedures
SET title = ?2, description = ?3, content = ?4, category = ?5, difficulty = ?6, estimated_time = ?7,
    is_active = ?8, author_id = ?9, status = ?10, slug = ?11, meta_description = ?12,
    featured = ?13, updated_at = ?14
WHERE id = ?1
"#;

pub const DELETE_PROCEDURE: &str = "DELETE FROM procedures WHERE id = ?1";

pub const SELECT_PROCEDURE_IMAGES: &str = "SELECT images FROM procedures WHERE id = ?1";
pub const UPDATE_PROCEDURE_IMAGES: &str = "UPDATE procedures SET images = ?2 WHERE id = ?1";

pub const SELECT_PROCEDURE_ATTACHMENTS: &str = "SELECT attachments FROM procedures WHERE id = ?1";
pub const UPDATE_PROCEDURE_ATTACHMENTS: &str =
    "UPDATE procedures SET attachments = ?2 WHERE id = ?1";

pub const INCREMENT_PROCEDURE_VIEWS: &str =
    "UPDATE procedures SET views = views + 1 WHERE id = ?1";
pub const INCREMENT_PROCEDURE_LIKES: &str =
    "UPDATE procedures SET likes = likes + 1 WHERE id = ?1";
pub const INCREMENT_PROCEDURE_BOOKMARKS: &str =
    "UPDATE procedures SET bookmarks = bookmarks + 1 WHERE id = ?1";

pub const SELECT_PROCEDURE_EXISTS: &str = "SELECT 1 FROM procedures WHERE id = ?1";

// Tag queries
pub const INSERT_TAG: &str = r#"
INSERT INTO procedure_tags (id, name, slug, description, color, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub const SELECT_ALL_TAGS: &str =
    "SELECT id, name, slug, description, color, created_at FROM procedure_tags ORDER BY name ASC";

pub const SELECT_TAG_BY_NAME: &str =
    "SELECT id, name, slug, description, color, created_at FROM procedure_tags WHERE name = ?1";

pub const SELECT_ALL_TAG_SLUGS: &str = "SELECT slug FROM procedure_tags";

pub const SELECT_TAGS_BY_PROCEDURE: &str = r#"
SELECT t.id, t.name, t.slug, t.description, t.color, t.created_at
FROM procedure_tags t
JOIN procedure_tag_links l ON l.tag_id = t.id
WHERE l.procedure_id = ?1
ORDER BY t.name ASC
"#;

pub const SELECT_ALL_TAG_LINKS: &str = r#"
SELECT l.procedure_id, t.slug
FROM procedure_tag_links l
JOIN procedure_tags t ON t.id = l.tag_id
"#;

pub const DELETE_TAG_LINKS: &str = "DELETE FROM procedure_tag_links WHERE procedure_id = ?1";
pub const INSERT_TAG_LINK: &str =
    "INSERT OR IGNORE INTO procedure_tag_links (procedure_id, tag_id) VALUES (?1, ?2)";

// Relation queries
pub const DELETE_RELATIONS: &str =
    "DELETE FROM procedure_relations WHERE low_id = ?1 OR high_id = ?1";
pub const INSERT_RELATION: &str =
    "INSERT OR IGNORE INTO procedure_relations (low_id, high_id) VALUES (?1, ?2)";

// Interaction queries
pub const INSERT_INTERACTION: &str = r#"
INSERT OR IGNORE INTO procedure_interactions (id, user_id, procedure_id, kind, created_at)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

// Notification queries
pub const INSERT_NOTIFICATION: &str = r#"
INSERT INTO notifications (id, user_id, title, message, ticket_id, is_read, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub const SELECT_NOTIFICATION_BY_ID: &str = r#"
SELECT id, user_id, title, message, ticket_id, is_read, created_at
FROM notifications
WHERE id = ?1
"#;

pub const SELECT_NOTIFICATIONS_BY_USER: &str = r#"
SELECT id, user_id, title, message, ticket_id, is_read, created_at
FROM notifications
WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0)
ORDER BY created_at DESC
"#;

pub const MARK_NOTIFICATION_READ: &str = "UPDATE notifications SET is_read = 1 WHERE id = ?1";
pub const MARK_ALL_NOTIFICATIONS_READ: &str =
    "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0";
pub const COUNT_UNREAD_NOTIFICATIONS: &str =
    "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0";
