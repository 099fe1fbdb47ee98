//! Sites of one installation share a database but nothing else.

use polyglot_rs_db::{NewTerm, Post};
use polyglot_rs_languages::NewLanguage;
use polyglot_rs_objects::{Translatable, Translated};
use polyglot_rs_test::{assert_max_queries, assert_num_queries, key, translations, TestSite};

#[test]
fn test_same_object_id_keeps_a_language_per_site() {
    let main = TestSite::new();
    let second = main.other_site(2);
    assert_eq!(second.tables().prefix, "wp_2_");
    second
        .languages()
        .add(&NewLanguage::new("Deutsch", "de", "de_DE"))
        .unwrap();

    let on_main = main.page("Bonjour", Some("fr"));
    let on_second = second
        .context()
        .content
        .insert_post(&Post::new("page", "Hallo"))
        .unwrap();
    second.posts().set_language(on_second, Some(key("de"))).unwrap();
    assert_eq!(on_main, on_second);

    assert_eq!(main.posts().get_language(on_main).unwrap().unwrap().slug, "fr");
    assert_eq!(second.posts().get_language(on_second).unwrap().unwrap().slug, "de");
    assert!(second.languages().get("fr").unwrap().is_none());
    assert_eq!(second.languages().get_default().unwrap().unwrap().slug, "de");
}

#[test]
fn test_groups_do_not_leak_between_sites() {
    let main = TestSite::new();
    let second = main.other_site(2);
    second
        .languages()
        .add(&NewLanguage::new("English", "en", "en_US"))
        .unwrap();

    let p1 = main.page("One", Some("en"));
    let p2 = main.page("Un", Some("fr"));
    main.posts()
        .save_translations(p1, &translations(&[("en", p1), ("fr", p2)]))
        .unwrap();

    let q1 = second
        .context()
        .content
        .insert_post(&Post::new("page", "One"))
        .unwrap();
    second.posts().set_language(q1, Some(key("en"))).unwrap();
    assert_eq!(q1, p1);
    assert_eq!(second.posts().get_translations(q1).unwrap(), translations(&[("en", q1)]));
    assert!(second.posts().get_group(q1).unwrap().is_none());
}

#[test]
fn test_warm_lookups_stay_off_the_database() {
    let site = TestSite::new();
    let page = site.page("Hello", Some("en"));
    site.page("Orphan", None);

    site.posts().get_language(page).unwrap();
    site.posts().get_objects_with_no_lang(0, None).unwrap();

    assert_num_queries(&site.db, 0, || {
        assert_eq!(site.posts().get_language(page).unwrap().unwrap().slug, "en");
        assert_eq!(site.languages().all().unwrap().len(), 2);
        assert_eq!(site.posts().get_objects_with_no_lang(0, None).unwrap().len(), 1);
    });

    site.context()
        .taxonomy
        .insert_term("nav_menu", &NewTerm::new("Main"))
        .unwrap();
    assert_num_queries(&site.db, 0, || {
        assert_eq!(site.posts().get_language(page).unwrap().unwrap().slug, "en");
    });
}

#[test]
fn test_rewired_site_reuses_warm_caches() {
    let site = TestSite::new();
    let page = site.page("Hello", Some("fr"));
    site.posts().get_language(page).unwrap();

    let rewired = site.engine.main_site().unwrap();
    // Wiring checks the schema; lookups afterwards hit the shared caches.
    assert_num_queries(&site.db, 0, || {
        assert_eq!(rewired.posts().get_language(page).unwrap().unwrap().slug, "fr");
    });
}

#[test]
fn test_writes_on_one_site_keep_other_sites_warm() {
    let main = TestSite::new();
    let second = main.other_site(2);
    second
        .languages()
        .add(&NewLanguage::new("English", "en", "en_US"))
        .unwrap();
    let q = second
        .context()
        .content
        .insert_post(&Post::new("page", "Kept"))
        .unwrap();
    second.posts().set_language(q, Some(key("en"))).unwrap();
    second.posts().get_language(q).unwrap();

    let p = main.page("Changed", Some("en"));
    main.posts().set_language(p, Some(key("fr"))).unwrap();

    assert_num_queries(&main.db, 0, || {
        assert_eq!(second.posts().get_language(q).unwrap().unwrap().slug, "en");
    });
    assert_max_queries(&main.db, 10, || {
        assert_eq!(main.posts().get_language(p).unwrap().unwrap().slug, "fr");
    });
}
