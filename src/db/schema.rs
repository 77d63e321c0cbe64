/// Tables managed by the importer, in an order that is safe for dropping
/// and clearing.
pub const TABLES: &[&str] = &[
    "tag_relation",
    "drawing",
    "media_tag",
    "tag",
    "category",
    "blockitem",
    "media",
    "dir",
];

// Foreign keys are declared for documentation only and switched off on every
// connection `Database` opens. Category and media rows are replaced by
// delete + insert and must not cascade.
pub const SCHEMA: &str = r#"
-- Directories of media files, relative to the image root
CREATE TABLE IF NOT EXISTS dir (
    id INTEGER PRIMARY KEY,
    path TEXT NOT NULL UNIQUE
);

-- Media items
CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY,
    dirid INTEGER NOT NULL REFERENCES dir(id),
    filename TEXT NOT NULL,
    md5sum CHAR(32),
    type TEXT NOT NULL,              -- 'image', 'video', 'audio' or as found in the source
    label TEXT,
    description TEXT,
    starttime TEXT,                  -- YYYY-MM-DDTHH:MM:SS, NULL when unknown
    endtime TEXT,
    width INTEGER,                   -- NULL when unknown
    height INTEGER,
    angle INTEGER,
    UNIQUE (dirid, filename)
);

CREATE INDEX IF NOT EXISTS idx_media_time ON media(starttime, endtime, id);

-- Files excluded from the collection
CREATE TABLE IF NOT EXISTS blockitem (
    dirid INTEGER NOT NULL REFERENCES dir(id),
    filename TEXT NOT NULL,
    PRIMARY KEY (dirid, filename)
);

-- Tag categories
CREATE TABLE IF NOT EXISTS category (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    icon TEXT,
    visible INTEGER,
    viewtype INTEGER,
    thumbsize INTEGER
);

-- Tags: (category, item) pairs
CREATE TABLE IF NOT EXISTS tag (
    id INTEGER PRIMARY KEY,
    categoryid INTEGER NOT NULL REFERENCES category(id),
    name TEXT NOT NULL,
    isgroup INTEGER NOT NULL DEFAULT 0,
    birthdate TEXT,                  -- YYYY-MM-DD
    UNIQUE (categoryid, name)
);

-- Media item to tag mapping
CREATE TABLE IF NOT EXISTS media_tag (
    mediaid INTEGER NOT NULL REFERENCES media(id),
    tagid INTEGER NOT NULL REFERENCES tag(id),
    area TEXT,                       -- region of the image the tag applies to
    PRIMARY KEY (mediaid, tagid)
);

CREATE INDEX IF NOT EXISTS idx_media_tag_tag ON media_tag(tagid, mediaid);

-- Freehand drawings on media items
CREATE TABLE IF NOT EXISTS drawing (
    id INTEGER PRIMARY KEY,
    mediaid INTEGER NOT NULL REFERENCES media(id),
    shape INTEGER NOT NULL,          -- 0 circle, 1 line, 2 rectangle
    x0 INTEGER NOT NULL,
    y0 INTEGER NOT NULL,
    x1 INTEGER NOT NULL,
    y1 INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_drawing_media ON drawing(mediaid);

-- Member group relations: group tag -> member tag
CREATE TABLE IF NOT EXISTS tag_relation (
    grouptag INTEGER NOT NULL REFERENCES tag(id),
    membertag INTEGER NOT NULL REFERENCES tag(id),
    PRIMARY KEY (grouptag, membertag)
);
"#;
