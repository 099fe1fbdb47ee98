//! The post kind: posts, pages, and media attachments.

use std::sync::Arc;

use polyglot_rs_core::PolyglotResult;
use polyglot_rs_db::value::placeholders;
use polyglot_rs_db::{Post, Value};
use polyglot_rs_languages::LanguageKey;

use crate::context::ObjectContext;
use crate::kind::KindDescriptor;
use crate::translatable::Translatable;
use crate::translated::Translated;

/// The post type of media attachments.
pub const ATTACHMENT: &str = "attachment";

/// Statuses never listed as lacking a language.
const IGNORED_STATUSES: [&str; 1] = ["auto-draft"];

/// Posts of the translated post types.
#[derive(Debug)]
pub struct TranslatedPost {
    ctx: Arc<ObjectContext>,
    descriptor: KindDescriptor,
    post_types: Vec<String>,
}

impl TranslatedPost {
    pub fn new(ctx: Arc<ObjectContext>, post_types: Vec<String>) -> Self {
        Self {
            ctx,
            descriptor: KindDescriptor::post(),
            post_types,
        }
    }

    /// Creates the translation of a media attachment in `lang`.
    ///
    /// The attachment row and its metadata (file path included) are copied;
    /// the file itself is shared. The parent is replaced by its translation
    /// in `lang`, if any. The copy joins the source's translation group.
    ///
    /// Returns the existing translation if there is one, and `0` when `id`
    /// is not a translated attachment or `lang` does not resolve.
    pub fn create_media_translation(&self, id: i64, lang: &LanguageKey) -> PolyglotResult<i64> {
        if !self.post_types.iter().any(|t| t == ATTACHMENT) {
            tracing::debug!(id, "media is not translated");
            return Ok(0);
        }
        let Some(source) = self.ctx.content.get_post(id)? else {
            return Ok(0);
        };
        if source.post_type != ATTACHMENT {
            return Ok(0);
        }
        let Some(lang) = self.ctx.languages.get(lang.clone())? else {
            return Ok(0);
        };
        let existing = self.get_translation(id, &LanguageKey::from(&lang))?;
        if existing > 0 {
            return Ok(existing);
        }

        let parent = if source.post_parent > 0 {
            self.get_translation(source.post_parent, &LanguageKey::from(&lang))?
        } else {
            0
        };
        let copy = Post {
            id: 0,
            post_parent: parent,
            ..source
        };
        let copy_id = self.ctx.content.insert_post(&copy)?;
        for (key, value) in self.ctx.content.get_all_post_meta(id)? {
            self.ctx.content.add_post_meta(copy_id, &key, &value)?;
        }

        self.set_language(copy_id, Some(LanguageKey::from(&lang)))?;
        let mut translations = self.get_translations(id)?;
        translations.insert(lang.slug.clone(), copy_id);
        self.save_translations(id, &translations)?;
        tracing::info!(source = id, copy = copy_id, lang = %lang.slug, "media translation created");
        Ok(copy_id)
    }

    /// Deletes a post together with its language link and group membership.
    pub fn delete_post(&self, id: i64) -> PolyglotResult<bool> {
        self.on_object_deleted(id)?;
        self.ctx.content.delete_post(id)
    }
}

impl Translatable for TranslatedPost {
    fn descriptor(&self) -> &KindDescriptor {
        &self.descriptor
    }

    fn context(&self) -> &ObjectContext {
        &self.ctx
    }

    fn subtypes(&self) -> &[String] {
        &self.post_types
    }

    fn object_subtype(&self, id: i64) -> PolyglotResult<Option<String>> {
        Ok(self.ctx.content.get_post(id)?.map(|post| post.post_type))
    }

    fn objects_with_no_lang_sql(
        &self,
        subtypes: &[String],
        language_tt_ids: &[i64],
        limit: i64,
    ) -> (String, Vec<Value>) {
        let tables = self.ctx.taxonomy.tables();
        let mut params: Vec<Value> = subtypes.iter().map(Value::from).collect();
        params.extend(IGNORED_STATUSES.iter().map(|s| Value::from(*s)));
        let mut sql = format!(
            "SELECT p.ID AS id FROM {} AS p WHERE p.post_type IN ({}) AND p.post_status NOT IN ({})",
            tables.posts,
            placeholders(subtypes.len()),
            placeholders(IGNORED_STATUSES.len()),
        );
        if !language_tt_ids.is_empty() {
            sql.push_str(&format!(
                " AND p.ID NOT IN (SELECT tr.object_id FROM {} AS tr WHERE tr.term_taxonomy_id IN ({}))",
                tables.term_relationships,
                placeholders(language_tt_ids.len()),
            ));
            params.extend(language_tt_ids.iter().map(|id| Value::Int(*id)));
        }
        sql.push_str(" ORDER BY p.ID");
        if limit > 0 {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        (sql, params)
    }

    fn as_translated(&self) -> Option<&dyn Translated> {
        Some(self)
    }
}

impl Translated for TranslatedPost {}
