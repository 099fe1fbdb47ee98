//! Static description of a translatable kind.

use polyglot_rs_db::{Tables, POSTS_GROUP, TERMS_GROUP};
use polyglot_rs_languages::LanguageFacet;

/// Taxonomy of the translation groups of posts.
pub const POST_TRANSLATIONS_TAXONOMY: &str = "post_translations";
/// Taxonomy of the translation groups of terms.
pub const TERM_TRANSLATIONS_TAXONOMY: &str = "term_translations";

/// The table a kind's objects live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindTable {
    Posts,
    Terms,
}

impl KindTable {
    /// The table name on a given site.
    pub fn name(self, tables: &Tables) -> &str {
        match self {
            Self::Posts => &tables.posts,
            Self::Terms => &tables.terms,
        }
    }
}

/// What distinguishes one kind from another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindDescriptor {
    /// Name the kind is registered under (`post`, `term`).
    pub name: &'static str,
    /// The language facet scoping the kind's objects.
    pub facet: LanguageFacet,
    /// Taxonomy holding the kind's translation groups.
    pub group_taxonomy: &'static str,
    pub table: KindTable,
    /// Id column of `table`, used by join clauses.
    pub id_column: &'static str,
    /// Last-changed group bumped when an object's language changes.
    pub cache_group: &'static str,
    /// Whether a group survives with a single member.
    pub keeps_placeholder: bool,
    /// Capability checked before synchronizing translations.
    pub edit_capability: &'static str,
}

impl KindDescriptor {
    /// Posts, pages, and (optionally) media.
    pub const fn post() -> Self {
        Self {
            name: "post",
            facet: LanguageFacet::Language,
            group_taxonomy: POST_TRANSLATIONS_TAXONOMY,
            table: KindTable::Posts,
            id_column: "ID",
            cache_group: POSTS_GROUP,
            keeps_placeholder: false,
            edit_capability: "edit_post",
        }
    }

    /// Terms of translated taxonomies.
    pub const fn term() -> Self {
        Self {
            name: "term",
            facet: LanguageFacet::TermLanguage,
            group_taxonomy: TERM_TRANSLATIONS_TAXONOMY,
            table: KindTable::Terms,
            id_column: "term_id",
            cache_group: TERMS_GROUP,
            keeps_placeholder: true,
            edit_capability: "edit_term",
        }
    }
}
