//! Objects linked to their translations.
//!
//! Mutual translations share a translation group: a term of the kind's
//! translation taxonomy that every member is linked to, whose payload maps
//! language slugs to member ids. Reads never trust the payload blindly:
//! an entry only counts if its object still carries the language it is
//! keyed under. Stale entries are dropped from the returned view and fixed
//! in storage the next time the group is saved.
//!
//! A group is only written once it has two members. Posts drop a group
//! that shrinks to one member; terms keep it as a one-member placeholder.
//!
//! Group rewrites are read-modify-write without locking: two requests
//! saving the same group concurrently can overwrite each other, and the
//! read-time validation above is what heals the result.

use std::collections::{BTreeMap, BTreeSet};

use polyglot_rs_core::utils::sanitize::object_id;
use polyglot_rs_core::PolyglotResult;
use polyglot_rs_db::{atomic, LinkMode, NewTerm, Term, TermUpdate};
use polyglot_rs_languages::{Language, LanguageKey};

use crate::context::TranslationsSaved;
use crate::group::TranslationGroup;
use crate::translatable::Translatable;

/// Prefix of generated group names.
pub const GROUP_NAME_PREFIX: &str = "pll_";

/// Language slug → object id.
pub type Translations = BTreeMap<String, i64>;

/// A translatable kind that also maintains translation groups.
pub trait Translated: Translatable {
    /// The group taxonomy of the kind.
    fn group_taxonomy(&self) -> &'static str {
        self.descriptor().group_taxonomy
    }

    /// Returns the stored group an object is linked to.
    fn get_group(&self, id: i64) -> PolyglotResult<Option<TranslationGroup>> {
        let Some(id) = object_id(id) else {
            return Ok(None);
        };
        let ctx = self.context();
        match ctx.taxonomy.get_object_term(id, self.group_taxonomy())? {
            Some(term) => self.parse_group(term).map(Some),
            None => Ok(None),
        }
    }

    /// Parses a group term against the site's current language slugs.
    fn parse_group(&self, term: Term) -> PolyglotResult<TranslationGroup> {
        let langs = self.context().languages.all()?;
        Ok(TranslationGroup::parse(term, |key| {
            langs.iter().any(|lang| lang.slug == key)
        }))
    }

    /// Returns the translations of an object, itself included.
    ///
    /// Empty for invalid ids and objects without a language.
    fn get_translations(&self, id: i64) -> PolyglotResult<Translations> {
        let Some(id) = object_id(id) else {
            return Ok(Translations::new());
        };
        let Some(lang) = self.get_language(id)? else {
            return Ok(Translations::new());
        };
        let mut translations = Translations::new();
        if let Some(group) = self.get_group(id)? {
            for (slug, member) in group.members {
                if member == id || slug == lang.slug {
                    continue;
                }
                if self.get_language(member)?.is_some_and(|l| l.slug == slug) {
                    translations.insert(slug, member);
                } else {
                    tracing::warn!(
                        kind = self.name(),
                        group = %group.term.slug,
                        slug = %slug,
                        member,
                        "stale translation entry ignored"
                    );
                }
            }
        }
        translations.insert(lang.slug.clone(), id);
        Ok(translations)
    }

    /// Returns the translation of an object in `lang`, `0` if none.
    fn get_translation(&self, id: i64, lang: &LanguageKey) -> PolyglotResult<i64> {
        let Some(lang) = self.context().languages.get(lang.clone())? else {
            return Ok(0);
        };
        Ok(self
            .get_translations(id)?
            .get(&lang.slug)
            .copied()
            .unwrap_or(0))
    }

    /// Returns `id` if the object is in `lang`, else its translation in
    /// `lang`, else `0`.
    fn get(&self, id: i64, lang: &LanguageKey) -> PolyglotResult<i64> {
        let Some(target) = self.context().languages.get(lang.clone())? else {
            return Ok(0);
        };
        match self.get_language(id)? {
            Some(current) if current.slug == target.slug => Ok(id),
            Some(_) => self.get_translation(id, &LanguageKey::Code(target.slug.clone())),
            None => Ok(0),
        }
    }

    /// Keeps the entries of `translations` that can join the group of `id`.
    ///
    /// Unknown languages, invalid ids, objects whose language differs from
    /// their key, and objects of another subtype are dropped. The object
    /// itself is always present under its own language.
    fn validate_translations(&self, id: i64, lang: &Language, translations: &Translations) -> PolyglotResult<Translations> {
        let ctx = self.context();
        let subtype = self.object_subtype(id)?;
        let mut valid = Translations::new();
        for (slug, &member) in translations {
            let Some(member) = object_id(member) else {
                tracing::warn!(kind = self.name(), slug = %slug, "invalid translation id dropped");
                continue;
            };
            if member == id || *slug == lang.slug {
                continue;
            }
            if !ctx
                .languages
                .get(LanguageKey::Code(slug.clone()))?
                .is_some_and(|l| l.slug == *slug)
            {
                tracing::warn!(kind = self.name(), slug = %slug, "unknown language dropped");
                continue;
            }
            if !self.get_language(member)?.is_some_and(|l| l.slug == *slug) {
                tracing::warn!(kind = self.name(), slug = %slug, member, "translation in another language dropped");
                continue;
            }
            if self.object_subtype(member)? != subtype {
                tracing::warn!(kind = self.name(), member, "translation of another subtype dropped");
                continue;
            }
            valid.insert(slug.clone(), member);
        }
        valid.insert(lang.slug.clone(), id);
        Ok(valid)
    }

    /// Makes `translations` the translation group of `id`.
    ///
    /// Invalid entries are dropped (see
    /// [`validate_translations`](Self::validate_translations)); former
    /// members missing from the new set leave the group. Returns the
    /// translations actually saved.
    fn save_translations(&self, id: i64, translations: &Translations) -> PolyglotResult<Translations> {
        let Some(id) = object_id(id) else {
            return Ok(Translations::new());
        };
        let Some(lang) = self.get_language(id)? else {
            tracing::debug!(kind = self.name(), id, "object has no language, translations not saved");
            return Ok(Translations::new());
        };
        let ctx = self.context();
        let valid = self.validate_translations(id, &lang, translations)?;
        // Unlinking below may collapse the group; a rebuilt one keeps its extras.
        let extras = self.get_group(id)?.map(|group| group.extras).unwrap_or_default();

        for (slug, member) in self.get_translations(id)? {
            if member != id && valid.get(&slug) != Some(&member) {
                self.delete_translation(member)?;
            }
        }

        let current = self.get_group(id)?;
        if current.as_ref().is_some_and(|group| group.members == valid) {
            tracing::debug!(kind = self.name(), id, "translations unchanged");
            return Ok(valid);
        }
        if valid.len() < 2 {
            return Ok(valid);
        }

        atomic(ctx.db().as_ref(), || {
            let mut stale = BTreeSet::new();
            for &member in valid.values() {
                if member == id {
                    continue;
                }
                if let Some(other) = self.get_group(member)? {
                    if current.as_ref().map(|g| g.term.term_id) != Some(other.term.term_id) {
                        stale.insert(other.term.term_id);
                        self.leave_group(member, false)?;
                    }
                }
            }

            let group = match self.get_group(id)? {
                Some(group) => ctx.taxonomy.update_term(
                    group.term.term_id,
                    &TermUpdate {
                        description: Some(TranslationGroup::payload(&group.extras, &valid)),
                        ..TermUpdate::default()
                    },
                )?,
                None => {
                    let name = format!("{GROUP_NAME_PREFIX}{}", uuid::Uuid::new_v4().simple());
                    let term = ctx.taxonomy.insert_term(
                        self.group_taxonomy(),
                        &NewTerm::new(name.as_str())
                            .slug(name.as_str())
                            .description(TranslationGroup::payload(&extras, &valid)),
                    )?;
                    tracing::info!(kind = self.name(), group = %term.slug, "translation group created");
                    term
                }
            };

            for &member in valid.values() {
                ctx.taxonomy.set_object_terms(
                    member,
                    self.group_taxonomy(),
                    &[group.term_taxonomy_id],
                    LinkMode::Replace,
                )?;
            }
            for term_id in stale {
                if let Some(term) = ctx.taxonomy.get_term(term_id)? {
                    if term.count == 0 {
                        ctx.taxonomy.delete_term(term_id)?;
                    }
                }
            }
            Ok(())
        })?;

        self.clean_cache();
        tracing::info!(kind = self.name(), id, members = valid.len(), "translations saved");
        ctx.translations_saved.send(&TranslationsSaved {
            kind: self.name(),
            object_id: id,
            translations: valid.clone(),
        });
        Ok(valid)
    }

    /// Takes an object out of its group.
    ///
    /// A group left empty is deleted unless `sole_member_stays`, in which
    /// case the object stays as the group's only member. A group left with
    /// one member is deleted for kinds without placeholders.
    fn leave_group(&self, id: i64, sole_member_stays: bool) -> PolyglotResult<()> {
        match self.get_group(id)? {
            Some(group) => self.shrink_group(group, id, sole_member_stays),
            None => Ok(()),
        }
    }

    /// Removes `id` from `group` and unlinks it, applying the collapse
    /// rules of [`leave_group`](Self::leave_group).
    fn shrink_group(&self, mut group: TranslationGroup, id: i64, sole_member_stays: bool) -> PolyglotResult<()> {
        let ctx = self.context();
        group.remove_member(id);
        let remaining = group.members.len();
        if remaining == 0 && sole_member_stays {
            return Ok(());
        }
        if remaining == 0 || (remaining == 1 && !self.descriptor().keeps_placeholder) {
            ctx.taxonomy.delete_term(group.term.term_id)?;
            tracing::debug!(kind = self.name(), group = %group.term.slug, "translation group deleted");
        } else {
            atomic(ctx.db().as_ref(), || {
                ctx.taxonomy.update_term(
                    group.term.term_id,
                    &TermUpdate {
                        description: Some(TranslationGroup::payload(&group.extras, &group.members)),
                        ..TermUpdate::default()
                    },
                )?;
                ctx.taxonomy.remove_object_terms(
                    id,
                    self.group_taxonomy(),
                    &[group.term.term_taxonomy_id],
                )
            })?;
        }
        self.clean_cache();
        Ok(())
    }

    /// Removes an object from its translation group.
    fn delete_translation(&self, id: i64) -> PolyglotResult<()> {
        self.leave_group(id, self.descriptor().keeps_placeholder)
    }

    /// Cleans up after an object was deleted: leaves its group (deleting
    /// the group if nothing is left, whatever the kind) and unlinks its
    /// language.
    fn on_object_deleted(&self, id: i64) -> PolyglotResult<()> {
        self.leave_group(id, false)?;
        self.delete_language(id)
    }

    /// Strips `lang` from every group of the kind, before the language is
    /// deleted.
    fn remove_language_from_groups(&self, lang: &Language) -> PolyglotResult<()> {
        let ctx = self.context();
        for term in ctx.taxonomy.get_terms(self.group_taxonomy())? {
            let group = self.parse_group(term)?;
            if let Some(&member) = group.members.get(&lang.slug) {
                self.shrink_group(group, member, false)?;
            }
        }
        Ok(())
    }

    /// Whether the current user may edit the object and every one of its
    /// translations.
    fn current_user_can_synchronize(&self, id: i64) -> PolyglotResult<bool> {
        let Some(id) = object_id(id) else {
            return Ok(false);
        };
        let ctx = self.context();
        let capability = self.descriptor().edit_capability;
        let mut ids: Vec<i64> = self.get_translations(id)?.into_values().collect();
        if !ids.contains(&id) {
            ids.push(id);
        }
        Ok(ids
            .into_iter()
            .all(|member| ctx.permissions.current_user_can(capability, member)))
    }
}
