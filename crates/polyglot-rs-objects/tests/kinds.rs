//! Integration tests for the post and term kinds over an in-memory site.

use std::sync::{Arc, Mutex};

use polyglot_rs_core::cache::{LastChanged, TenantCache};
use polyglot_rs_core::settings::LanguageSettings;
use polyglot_rs_core::PolyglotError;
use polyglot_rs_db::{
    install, ContentStore, DbExecutor, NewTerm, OptionsStore, Post, SqliteBackend, Tables, TaxonomyStore,
    TermUpdate,
};
use polyglot_rs_languages::{DeletePolicy, LanguageFactory, LanguageKey, LanguageRegistry, NewLanguage};
use polyglot_rs_objects::{
    AllowAll, GrantedPermissions, LanguageFilter, ObjectCaches, ObjectContext, ObjectRegistry, PermissionChecker,
    TermInsertContext, Translatable, Translated, TranslatedPost, TranslatedTerm, Translations, TranslationsSaved,
};

struct Site {
    languages: Arc<LanguageRegistry>,
    ctx: Arc<ObjectContext>,
    posts: Arc<TranslatedPost>,
    terms: Arc<TranslatedTerm>,
    objects: ObjectRegistry,
}

fn site_with(permissions: Arc<dyn PermissionChecker>) -> Site {
    let db: Arc<dyn DbExecutor> = Arc::new(SqliteBackend::memory().unwrap());
    let tables = Tables::for_site("wp_", 1);
    install(db.as_ref(), &tables).unwrap();
    let last_changed = LastChanged::new();
    let taxonomy = TaxonomyStore::new(Arc::clone(&db), tables.clone(), last_changed.clone());
    let languages = Arc::new(LanguageRegistry::new(
        taxonomy.clone(),
        OptionsStore::new(Arc::clone(&db), tables.clone()),
        LanguageFactory::detached(),
        TenantCache::new().for_site(1),
        LanguageSettings::default(),
    ));
    languages.add(&NewLanguage::new("English", "en", "en_US")).unwrap();
    languages.add(&NewLanguage::new("Français", "fr", "fr_FR").term_group(1)).unwrap();
    languages.add(&NewLanguage::new("Deutsch", "de", "de_DE").term_group(2)).unwrap();

    let ctx = Arc::new(ObjectContext::new(
        Arc::clone(&languages),
        taxonomy,
        ContentStore::new(db, tables, last_changed.clone()),
        last_changed,
        ObjectCaches {
            languages: TenantCache::new().for_site(1),
            queries: TenantCache::new().for_site(1),
        },
        permissions,
    ));
    let posts = Arc::new(TranslatedPost::new(
        Arc::clone(&ctx),
        vec!["post".into(), "page".into(), "attachment".into()],
    ));
    let terms = Arc::new(TranslatedTerm::new(
        Arc::clone(&ctx),
        vec!["category".into(), "post_tag".into()],
    ));
    let mut objects = ObjectRegistry::new(Arc::clone(&languages));
    objects.register(posts.clone());
    objects.register(terms.clone());
    Site {
        languages,
        ctx,
        posts,
        terms,
        objects,
    }
}

fn site() -> Site {
    site_with(Arc::new(AllowAll))
}

fn key(code: &str) -> LanguageKey {
    LanguageKey::from(code)
}

fn tr(pairs: &[(&str, i64)]) -> Translations {
    pairs.iter().map(|(slug, id)| ((*slug).to_string(), *id)).collect()
}

impl Site {
    fn post(&self, post_type: &str, title: &str, lang: Option<&str>) -> i64 {
        let id = self.ctx.content.insert_post(&Post::new(post_type, title)).unwrap();
        if let Some(lang) = lang {
            assert!(self.posts.set_language(id, Some(key(lang))).unwrap());
        }
        id
    }

    fn term(&self, name: &str, lang: Option<&str>) -> i64 {
        self.terms
            .insert_term("category", &NewTerm::new(name), lang.map(key), None)
            .unwrap()
            .term_id
    }

    fn count(&self, lang: &str) -> i64 {
        self.languages.get(lang).unwrap().unwrap().count()
    }
}

// ── Language links ─────────────────────────────────────────────────────

#[test]
fn test_set_language_is_idempotent() {
    let site = site();
    let page = site.post("page", "About", None);
    assert!(site.posts.get_language(page).unwrap().is_none());

    assert!(site.posts.set_language(page, Some(key("en"))).unwrap());
    assert!(!site.posts.set_language(page, Some(key("en"))).unwrap());
    assert_eq!(site.posts.get_language(page).unwrap().unwrap().slug, "en");
    assert_eq!(site.count("en"), 1);

    assert!(site.posts.set_language(page, Some(key("fr"))).unwrap());
    assert_eq!(site.posts.get_language(page).unwrap().unwrap().slug, "fr");
    assert_eq!(site.posts.get_translations(page).unwrap(), tr(&[("fr", page)]));
    assert_eq!(site.count("en"), 0);

    assert!(site.posts.set_language(page, None).unwrap());
    assert!(site.posts.get_language(page).unwrap().is_none());
    assert!(site.posts.get_translations(page).unwrap().is_empty());
}

#[test]
fn test_invalid_ids_are_neutral() {
    let site = site();
    assert!(!site.posts.set_language(0, Some(key("en"))).unwrap());
    assert!(site.posts.get_language(-3).unwrap().is_none());
    assert!(site.posts.get_translations(0).unwrap().is_empty());
    assert_eq!(site.posts.get_translation(-1, &key("fr")).unwrap(), 0);
    assert!(site.posts.save_translations(0, &tr(&[("en", 1)])).unwrap().is_empty());
}

#[test]
fn test_unknown_language_unsets() {
    let site = site();
    let page = site.post("page", "About", Some("en"));
    assert!(site.posts.set_language(page, Some(key("zz"))).unwrap());
    assert!(site.posts.get_language(page).unwrap().is_none());
}

// ── Translation groups ─────────────────────────────────────────────────

#[test]
fn test_save_translations_links_both_ways() {
    let site = site();
    let p1 = site.post("page", "Hello", Some("en"));
    let p2 = site.post("page", "Bonjour", Some("fr"));

    let saved = site.posts.save_translations(p1, &tr(&[("en", p1), ("fr", p2)])).unwrap();
    assert_eq!(saved, tr(&[("en", p1), ("fr", p2)]));
    assert_eq!(site.posts.get_translation(p1, &key("fr")).unwrap(), p2);
    assert_eq!(site.posts.get_translation(p2, &key("en")).unwrap(), p1);
    assert_eq!(site.posts.get(p1, &key("en")).unwrap(), p1);
    assert_eq!(site.posts.get(p1, &key("fr")).unwrap(), p2);
    assert_eq!(site.posts.get(p1, &key("de")).unwrap(), 0);

    let group = site.posts.get_group(p2).unwrap().unwrap();
    assert_eq!(group.term.taxonomy, "post_translations");
    assert!(group.term.name.starts_with("pll_"));
    assert_eq!(group.members, tr(&[("en", p1), ("fr", p2)]));
}

#[test]
fn test_single_member_is_never_stored() {
    let site = site();
    let page = site.post("page", "Alone", Some("en"));
    assert_eq!(site.posts.save_translations(page, &tr(&[("en", page)])).unwrap(), tr(&[("en", page)]));
    assert!(site.posts.get_group(page).unwrap().is_none());
}

#[test]
fn test_invalid_entries_are_dropped() {
    let site = site();
    let page_en = site.post("page", "Hello", Some("en"));
    let page_fr = site.post("page", "Bonjour", Some("fr"));
    let post_de = site.post("post", "Hallo", Some("de"));

    let saved = site
        .posts
        .save_translations(
            page_en,
            &tr(&[("en", 999), ("fr", page_fr), ("de", post_de), ("es", page_fr)]),
        )
        .unwrap();
    assert_eq!(saved, tr(&[("en", page_en), ("fr", page_fr)]));
    assert_eq!(site.posts.get_translations(page_fr).unwrap(), saved);
}

#[test]
fn test_delete_translation_collapses_post_group() {
    let site = site();
    let p1 = site.post("page", "Hello", Some("en"));
    let p2 = site.post("page", "Bonjour", Some("fr"));
    site.posts.save_translations(p1, &tr(&[("en", p1), ("fr", p2)])).unwrap();

    site.posts.delete_translation(p1).unwrap();
    assert_eq!(site.posts.get_translations(p2).unwrap(), tr(&[("fr", p2)]));
    assert_eq!(site.posts.get_translations(p1).unwrap(), tr(&[("en", p1)]));
    assert!(site.posts.get_group(p1).unwrap().is_none());
    assert!(site.posts.get_group(p2).unwrap().is_none());
    assert!(site.ctx.taxonomy.get_terms("post_translations").unwrap().is_empty());
}

#[test]
fn test_delete_translation_keeps_term_placeholder() {
    let site = site();
    let t1 = site.term("Hello", Some("en"));
    let t2 = site.term("Bonjour", Some("fr"));
    site.terms.save_translations(t1, &tr(&[("en", t1), ("fr", t2)])).unwrap();

    site.terms.delete_translation(t1).unwrap();
    assert_eq!(site.terms.get_translations(t2).unwrap(), tr(&[("fr", t2)]));
    assert!(site.terms.get_group(t1).unwrap().is_none());
    let placeholder = site.terms.get_group(t2).unwrap().unwrap();
    assert_eq!(placeholder.members, tr(&[("fr", t2)]));

    // The last member never empties its placeholder.
    site.terms.delete_translation(t2).unwrap();
    assert_eq!(site.terms.get_group(t2).unwrap().unwrap().members, tr(&[("fr", t2)]));
    assert_eq!(site.ctx.taxonomy.get_terms("term_translations").unwrap().len(), 1);
}

#[test]
fn test_language_change_leaves_group() {
    let site = site();
    let p1 = site.post("page", "Hello", Some("en"));
    let p2 = site.post("page", "Bonjour", Some("fr"));
    site.posts.save_translations(p1, &tr(&[("en", p1), ("fr", p2)])).unwrap();

    assert!(site.posts.set_language(p2, Some(key("en"))).unwrap());
    assert_eq!(site.posts.get_translations(p1).unwrap(), tr(&[("en", p1)]));
    assert_eq!(site.posts.get_language(p2).unwrap().unwrap().slug, "en");
    assert!(site.ctx.taxonomy.get_terms("post_translations").unwrap().is_empty());
}

#[test]
fn test_member_moves_to_new_group() {
    let site = site();
    let p1 = site.post("page", "Hello", Some("en"));
    let p2 = site.post("page", "Bonjour", Some("fr"));
    let p3 = site.post("page", "Hi", Some("en"));
    site.posts.save_translations(p1, &tr(&[("en", p1), ("fr", p2)])).unwrap();

    site.posts.save_translations(p3, &tr(&[("en", p3), ("fr", p2)])).unwrap();
    assert_eq!(site.posts.get_translations(p1).unwrap(), tr(&[("en", p1)]));
    assert_eq!(site.posts.get_translation(p2, &key("en")).unwrap(), p3);
    assert_eq!(site.ctx.taxonomy.get_terms("post_translations").unwrap().len(), 1);
}

#[test]
fn test_removed_member_leaves_group() {
    let site = site();
    let en = site.post("page", "Hello", Some("en"));
    let fr = site.post("page", "Bonjour", Some("fr"));
    let de = site.post("page", "Hallo", Some("de"));
    site.posts.save_translations(en, &tr(&[("en", en), ("fr", fr), ("de", de)])).unwrap();

    site.posts.save_translations(en, &tr(&[("en", en), ("de", de)])).unwrap();
    assert_eq!(site.posts.get_translations(de).unwrap(), tr(&[("en", en), ("de", de)]));
    assert_eq!(site.posts.get_translations(fr).unwrap(), tr(&[("fr", fr)]));
    assert!(site.posts.get_group(fr).unwrap().is_none());
}

#[test]
fn test_rebuilt_group_keeps_extra_payload() {
    let site = site();
    let en = site.post("page", "Hello", Some("en"));
    let fr = site.post("page", "Bonjour", Some("fr"));
    let de = site.post("page", "Hallo", Some("de"));
    site.posts.save_translations(en, &tr(&[("en", en), ("fr", fr)])).unwrap();
    let group = site.posts.get_group(en).unwrap().unwrap();
    site.ctx
        .taxonomy
        .update_term(
            group.term.term_id,
            &TermUpdate {
                description: Some(format!(r#"{{"en":{en},"fr":{fr},"sync":["title"]}}"#)),
                ..TermUpdate::default()
            },
        )
        .unwrap();

    site.posts.save_translations(en, &tr(&[("en", en), ("de", de)])).unwrap();
    let rebuilt = site.posts.get_group(en).unwrap().unwrap();
    assert_eq!(rebuilt.members, tr(&[("en", en), ("de", de)]));
    assert_eq!(rebuilt.extras["sync"], serde_json::json!(["title"]));
    assert!(site.posts.get_group(fr).unwrap().is_none());
}

#[test]
fn test_translations_saved_signal() {
    let site = site();
    let seen: Arc<Mutex<Vec<(&'static str, i64, usize)>>> = Arc::default();
    let sink = Arc::clone(&seen);
    site.ctx.translations_saved.connect(
        "record",
        Arc::new(move |event: &TranslationsSaved| {
            sink.lock()
                .unwrap()
                .push((event.kind, event.object_id, event.translations.len()));
        }),
    );
    let p1 = site.post("page", "Hello", Some("en"));
    let p2 = site.post("page", "Bonjour", Some("fr"));

    site.posts.save_translations(p1, &tr(&[("en", p1), ("fr", p2)])).unwrap();
    site.posts.save_translations(p2, &tr(&[("en", p1), ("fr", p2)])).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![("post", p1, 2)]);
}

#[test]
fn test_current_user_can_synchronize() {
    let perms = Arc::new(GrantedPermissions::new());
    let site = site_with(perms.clone());
    let p1 = site.post("page", "Hello", Some("en"));
    let p2 = site.post("page", "Bonjour", Some("fr"));
    site.posts.save_translations(p1, &tr(&[("en", p1), ("fr", p2)])).unwrap();

    perms.grant("edit_post", p1);
    assert!(!site.posts.current_user_can_synchronize(p1).unwrap());
    perms.grant("edit_post", p2);
    assert!(site.posts.current_user_can_synchronize(p1).unwrap());
    assert!(!site.posts.current_user_can_synchronize(0).unwrap());
}

// ── Listings ───────────────────────────────────────────────────────────

#[test]
fn test_where_clause_counts() {
    let site = site();
    for title in ["a", "b"] {
        site.post("post", title, Some("en"));
    }
    for title in ["c", "d", "e"] {
        site.post("post", title, Some("fr"));
    }
    site.post("post", "f", None);
    let count = |filter: LanguageFilter| -> i64 {
        let (join, predicate) = site.posts.language_clauses("p", &filter).unwrap();
        let sql = format!(
            "SELECT COUNT(*) AS n FROM {} AS p{join} WHERE p.post_type = 'post'{predicate}",
            site.ctx.taxonomy.tables().posts,
        );
        site.ctx.db().query_one(&sql, &[]).unwrap().get::<i64>("n").unwrap()
    };

    assert_eq!(count("en".into()), 2);
    assert_eq!(count("en,fr".into()), 5);
    assert_eq!(count("zz".into()), 6);
    assert_eq!(count(LanguageFilter::Codes(Vec::new())), 6);
    let fr = site.languages.get("fr").unwrap().unwrap();
    assert_eq!(count((&fr).into()), 3);
}

#[test]
fn test_objects_with_no_lang() {
    let site = site();
    let page = site.post("page", "No language", None);
    site.post("post", "English", Some("en"));
    site.ctx
        .content
        .insert_post(&Post {
            post_status: "auto-draft".into(),
            ..Post::new("page", "Draft")
        })
        .unwrap();
    site.post("product", "Not translated", None);

    assert_eq!(site.posts.get_objects_with_no_lang(0, None).unwrap(), vec![page]);
    assert!(site
        .posts
        .get_objects_with_no_lang(0, Some(&["post".to_string()]))
        .unwrap()
        .is_empty());

    let later = site.post("post", "Later", None);
    assert_eq!(site.posts.get_objects_with_no_lang(0, None).unwrap(), vec![page, later]);
    assert_eq!(site.posts.get_objects_with_no_lang(1, None).unwrap(), vec![page]);
}

#[test]
fn test_assign_default_language_to_every_kind() {
    let site = site();
    let page = site.post("page", "P1", None);
    let cat = site.term("Uncategorized", None);

    assert_eq!(site.objects.assign_default_language(0).unwrap(), 2);
    assert_eq!(site.posts.get_language(page).unwrap().unwrap().slug, "en");
    assert_eq!(site.terms.get_language(cat).unwrap().unwrap().slug, "en");
    assert!(site.posts.get_objects_with_no_lang(0, None).unwrap().is_empty());
    assert!(site.terms.get_objects_with_no_lang(0, None).unwrap().is_empty());

    let en = site.languages.get("en").unwrap().unwrap();
    assert_eq!(en.count(), 1);
    assert_eq!(en.tl_count(), 1);
}

// ── Kind specifics ─────────────────────────────────────────────────────

#[test]
fn test_media_translation() {
    let site = site();
    let parent_en = site.post("page", "Gallery", Some("en"));
    let parent_fr = site.post("page", "Galerie", Some("fr"));
    site.posts
        .save_translations(parent_en, &tr(&[("en", parent_en), ("fr", parent_fr)]))
        .unwrap();

    let media = site
        .ctx
        .content
        .insert_post(&Post {
            post_parent: parent_en,
            post_mime_type: "image/jpeg".into(),
            guid: "http://localhost/uploads/photo.jpg".into(),
            ..Post::new("attachment", "Photo")
        })
        .unwrap();
    site.ctx
        .content
        .add_post_meta(media, "_wp_attached_file", "2024/photo.jpg")
        .unwrap();
    site.posts.set_language(media, Some(key("en"))).unwrap();

    let copy = site.posts.create_media_translation(media, &key("fr")).unwrap();
    assert!(copy > 0 && copy != media);
    let stored = site.ctx.content.get_post(copy).unwrap().unwrap();
    assert_eq!(stored.post_parent, parent_fr);
    assert_eq!(stored.guid, "http://localhost/uploads/photo.jpg");
    assert_eq!(
        site.ctx.content.get_post_meta(copy, "_wp_attached_file").unwrap().as_deref(),
        Some("2024/photo.jpg")
    );
    assert_eq!(site.posts.get_language(copy).unwrap().unwrap().slug, "fr");
    assert_eq!(site.posts.get_translation(media, &key("fr")).unwrap(), copy);
    assert_eq!(site.posts.create_media_translation(media, &key("fr")).unwrap(), copy);

    let without_media = TranslatedPost::new(Arc::clone(&site.ctx), vec!["page".into()]);
    assert_eq!(without_media.create_media_translation(media, &key("de")).unwrap(), 0);
    assert_eq!(site.posts.create_media_translation(parent_en, &key("de")).unwrap(), 0);
}

#[test]
fn test_delete_post_keeps_remaining_translations() {
    let site = site();
    let en = site.post("page", "Hello", Some("en"));
    let fr = site.post("page", "Bonjour", Some("fr"));
    let de = site.post("page", "Hallo", Some("de"));
    site.posts.save_translations(en, &tr(&[("en", en), ("fr", fr), ("de", de)])).unwrap();

    assert!(site.posts.delete_post(fr).unwrap());
    assert!(site.ctx.content.get_post(fr).unwrap().is_none());
    assert_eq!(site.posts.get_translations(en).unwrap(), tr(&[("en", en), ("de", de)]));
    assert_eq!(site.count("fr"), 0);
}

#[test]
fn test_term_slug_policy() {
    let site = site();
    let news_en = site
        .terms
        .insert_term("category", &NewTerm::new("News"), Some(key("en")), None)
        .unwrap();
    assert_eq!(news_en.slug, "news");

    let news_fr = site
        .terms
        .insert_term("category", &NewTerm::new("News"), Some(key("fr")), Some(news_en.term_id))
        .unwrap();
    assert_eq!(news_fr.slug, "news-fr");
    assert_eq!(site.terms.get_translation(news_en.term_id, &key("fr")).unwrap(), news_fr.term_id);

    let news_en_again = site
        .terms
        .insert_term("category", &NewTerm::new("News"), Some(key("en")), None)
        .unwrap();
    assert_eq!(news_en_again.slug, "news-2");

    let en = site.languages.get("en").unwrap().unwrap();
    assert_eq!(
        site.terms
            .unique_slug("news", Some(en.as_ref()), "category", Some(news_en.term_id))
            .unwrap(),
        "news"
    );

    let menu = site
        .terms
        .insert_term("nav_menu", &NewTerm::new("Main"), Some(key("en")), None)
        .unwrap();
    assert!(site.terms.get_language(menu.term_id).unwrap().is_none());
}

#[test]
fn test_create_translation_term_translates_parents() {
    let site = site();
    let world = site.term("World", Some("en"));
    let europe = site
        .terms
        .insert_term("category", &NewTerm::new("Europe").parent(world), Some(key("en")), None)
        .unwrap();
    assert_eq!(europe.parent, world);

    let europe_fr = site.terms.create_translation_term(europe.term_id, &key("fr")).unwrap();
    let world_fr = site.terms.get_translation(world, &key("fr")).unwrap();
    assert!(europe_fr > 0 && world_fr > 0);

    let stored = site.ctx.taxonomy.get_term(europe_fr).unwrap().unwrap();
    assert_eq!(stored.slug, "europe-fr");
    assert_eq!(stored.parent, world_fr);
    assert_eq!(site.ctx.taxonomy.get_term(world_fr).unwrap().unwrap().slug, "world-fr");
    assert_eq!(site.terms.create_translation_term(europe.term_id, &key("fr")).unwrap(), europe_fr);
    assert_eq!(site.terms.create_translation_term(europe.term_id, &key("zz")).unwrap(), 0);
}

#[test]
fn test_insert_filters_override_language_and_parent() {
    let site = site();
    let world = site.term("World", Some("en"));
    site.terms.language_filter.connect(
        "force-de",
        Arc::new(|_lang: Option<LanguageKey>, _insert: &TermInsertContext| Some(LanguageKey::from("de"))),
    );
    site.terms
        .parent_filter
        .connect("flat", Arc::new(|_parent: i64, _insert: &TermInsertContext| 0));

    let child = site
        .terms
        .insert_term("category", &NewTerm::new("Child").parent(world), Some(key("en")), None)
        .unwrap();
    assert_eq!(child.parent, 0);
    assert_eq!(site.terms.get_language(child.term_id).unwrap().unwrap().slug, "de");
}

// ── Language deletion ──────────────────────────────────────────────────

#[test]
fn test_delete_language_strips_groups() {
    let site = site();
    let en = site.post("page", "Hello", Some("en"));
    let fr = site.post("page", "Bonjour", Some("fr"));
    let de = site.post("page", "Hallo", Some("de"));
    site.posts.save_translations(en, &tr(&[("en", en), ("fr", fr), ("de", de)])).unwrap();

    assert!(matches!(
        site.objects.delete_language("de", DeletePolicy::Refuse),
        Err(PolyglotError::Conflict(_))
    ));
    assert!(site.languages.get("de").unwrap().is_some());

    assert!(site.objects.delete_language("de", DeletePolicy::Cascade).unwrap());
    assert!(site.languages.get("de").unwrap().is_none());
    assert!(site.posts.get_language(de).unwrap().is_none());
    assert_eq!(site.posts.get_group(en).unwrap().unwrap().members, tr(&[("en", en), ("fr", fr)]));

    assert!(site.objects.delete_language("fr", DeletePolicy::Cascade).unwrap());
    assert!(site.posts.get_group(en).unwrap().is_none());
    assert_eq!(site.posts.get_translations(en).unwrap(), tr(&[("en", en)]));
}

#[test]
fn test_deleted_language_no_longer_filters() {
    let site = site();
    site.post("post", "Hallo", Some("de"));
    let de = site.languages.get("de").unwrap().unwrap();
    let fr = site.languages.get("fr").unwrap().unwrap();
    assert!(!site.posts.where_clause(&(&de).into()).unwrap().is_empty());

    assert!(site.objects.delete_language("de", DeletePolicy::Cascade).unwrap());
    assert_eq!(site.posts.where_clause(&(&de).into()).unwrap(), "");
    assert_eq!(
        site.posts.language_clauses("p", &(&de).into()).unwrap(),
        (String::new(), String::new())
    );

    let both = site.posts.where_clause(&vec![de, Arc::clone(&fr)].into()).unwrap();
    assert_eq!(
        both,
        format!(" AND pll_tr.term_taxonomy_id IN ({})", site.posts.language_tt_id(&fr))
    );
}

#[test]
fn test_unrelated_term_writes_keep_language_lookups() {
    let site = site();
    let page = site.post("page", "Hello", Some("fr"));
    assert_eq!(site.posts.get_language(page).unwrap().unwrap().slug, "fr");
    let warm = site.ctx.caches.languages.len();

    for i in 0..5 {
        site.ctx
            .taxonomy
            .insert_term("nav_menu", &NewTerm::new(&format!("Menu {i}")))
            .unwrap();
        assert_eq!(site.posts.get_language(page).unwrap().unwrap().slug, "fr");
    }
    assert_eq!(site.ctx.caches.languages.len(), warm);

    site.posts.set_language(page, Some(key("de"))).unwrap();
    assert_eq!(site.posts.get_language(page).unwrap().unwrap().slug, "de");
}
