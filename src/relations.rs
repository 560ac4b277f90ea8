//! Relationship registry shared by the store schema and the access layer.
//!
//! Every association between entities is declared once here: the SQL migrations
//! derive their foreign-key clauses from it, the in-memory store walks its cascade
//! policy on delete, and relation-aware fetches validate relation names against it.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Account,
    Post,
    Comment,
}

impl EntityKind {
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Account => "accounts",
            EntityKind::Post => "posts",
            EntityKind::Comment => "comments",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Account => "Account",
            EntityKind::Post => "Post",
            EntityKind::Comment => "Comment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// The source row holds the foreign key and points at exactly one target.
    BelongsTo,
    /// Target rows hold a foreign key pointing back at the source.
    HasMany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
}

impl OnDelete {
    pub fn sql(self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub source: EntityKind,
    pub name: &'static str,
    pub target: EntityKind,
    pub cardinality: Cardinality,
    /// Column holding the reference. For `BelongsTo` it lives on the source table,
    /// for `HasMany` on the target table.
    pub foreign_key: &'static str,
    pub on_delete: OnDelete,
    /// Named constraint backing the reference; shared by both sides of an association.
    pub constraint: &'static str,
}

impl Relation {
    /// The table that physically stores the foreign key column.
    pub fn child(&self) -> EntityKind {
        match self.cardinality {
            Cardinality::BelongsTo => self.source,
            Cardinality::HasMany => self.target,
        }
    }

    /// The table referenced by the foreign key column.
    pub fn parent(&self) -> EntityKind {
        match self.cardinality {
            Cardinality::BelongsTo => self.target,
            Cardinality::HasMany => self.source,
        }
    }
}

pub const RELATIONS: &[Relation] = &[
    Relation {
        source: EntityKind::Account,
        name: "posts",
        target: EntityKind::Post,
        cardinality: Cardinality::HasMany,
        foreign_key: "owner_id",
        on_delete: OnDelete::Cascade,
        constraint: "fk_posts_owner",
    },
    Relation {
        source: EntityKind::Account,
        name: "comments",
        target: EntityKind::Comment,
        cardinality: Cardinality::HasMany,
        foreign_key: "author_id",
        on_delete: OnDelete::Cascade,
        constraint: "fk_comments_author",
    },
    Relation {
        source: EntityKind::Post,
        name: "owner",
        target: EntityKind::Account,
        cardinality: Cardinality::BelongsTo,
        foreign_key: "owner_id",
        on_delete: OnDelete::Cascade,
        constraint: "fk_posts_owner",
    },
    Relation {
        source: EntityKind::Post,
        name: "comments",
        target: EntityKind::Comment,
        cardinality: Cardinality::HasMany,
        foreign_key: "post_id",
        on_delete: OnDelete::Cascade,
        constraint: "fk_comments_post",
    },
    Relation {
        source: EntityKind::Comment,
        name: "author",
        target: EntityKind::Account,
        cardinality: Cardinality::BelongsTo,
        foreign_key: "author_id",
        on_delete: OnDelete::Cascade,
        constraint: "fk_comments_author",
    },
    Relation {
        source: EntityKind::Comment,
        name: "post",
        target: EntityKind::Post,
        cardinality: Cardinality::BelongsTo,
        foreign_key: "post_id",
        on_delete: OnDelete::Cascade,
        constraint: "fk_comments_post",
    },
];

pub fn relation(source: EntityKind, name: &str) -> Option<&'static Relation> {
    RELATIONS
        .iter()
        .find(|r| r.source == source && r.name == name)
}

/// Foreign keys stored on `child`, one per referenced table.
pub fn foreign_keys_of(child: EntityKind) -> impl Iterator<Item = &'static Relation> {
    RELATIONS
        .iter()
        .filter(move |r| r.source == child && r.cardinality == Cardinality::BelongsTo)
}

/// Cascade policy table: the foreign keys that point at `parent` and must be
/// followed when a `parent` row is deleted.
pub fn cascade_targets(parent: EntityKind) -> impl Iterator<Item = &'static Relation> {
    foreign_keys_of_all()
        .filter(move |r| r.target == parent && r.on_delete == OnDelete::Cascade)
}

fn foreign_keys_of_all() -> impl Iterator<Item = &'static Relation> {
    RELATIONS
        .iter()
        .filter(|r| r.cardinality == Cardinality::BelongsTo)
}

/// Table constraint clause for a `BelongsTo` relation.
pub fn foreign_key_clause(relation: &Relation) -> String {
    format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}(id) ON DELETE {} ON UPDATE NO ACTION",
        relation.constraint,
        relation.foreign_key,
        relation.parent().table(),
        relation.on_delete.sql()
    )
}
