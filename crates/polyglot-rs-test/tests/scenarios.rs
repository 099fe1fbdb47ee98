//! End-to-end scenarios over a fully wired site.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use polyglot_rs_core::PolyglotError;
use polyglot_rs_db::DbExecutor;
use polyglot_rs_languages::DeletePolicy;
use polyglot_rs_objects::{LanguageFilter, Translatable, Translated, Translations};
use polyglot_rs_test::{key, translations, TestSite};

const SLUGS: [&str; 3] = ["en", "fr", "de"];

fn three_languages() -> TestSite {
    TestSite::with_languages(&[
        ("English", "en", "en_US"),
        ("Français", "fr", "fr_FR"),
        ("Deutsch", "de", "de_DE"),
    ])
}

fn language_of<K: Translated + ?Sized>(kind: &K, id: i64) -> Option<String> {
    kind.get_language(id).unwrap().map(|lang| lang.slug.clone())
}

/// Checks every stored group of a kind: enough members, each carrying the
/// language it is keyed under and linked to that very group, and the same
/// translations read from every member.
fn check_groups<K: Translated + ?Sized>(kind: &K, min_members: usize) {
    let ctx = kind.context();
    for term in ctx.taxonomy.get_terms(kind.group_taxonomy()).unwrap() {
        let group = kind.parse_group(term).unwrap();
        assert!(
            group.members.len() >= min_members,
            "group {} of {} has {} members",
            group.term.slug,
            kind.name(),
            group.members.len()
        );
        for (slug, &member) in &group.members {
            assert_eq!(language_of(kind, member).as_deref(), Some(slug.as_str()));
            assert_eq!(
                kind.get_group(member).unwrap().map(|g| g.term.term_id),
                Some(group.term.term_id)
            );
            assert_eq!(kind.get_translations(member).unwrap(), group.members);
        }
    }
}

fn random_translations(rng: &mut StdRng, ids: &[i64]) -> Translations {
    let mut out = Translations::new();
    for slug in SLUGS {
        if rng.gen_bool(0.6) {
            out.insert(slug.to_string(), ids[rng.gen_range(0..ids.len())]);
        }
    }
    out
}

fn random_ops<K: Translated + ?Sized>(kind: &K, ids: &[i64], rng: &mut StdRng, min_members: usize) {
    for _ in 0..120 {
        let id = ids[rng.gen_range(0..ids.len())];
        match rng.gen_range(0..4) {
            0 => {
                let lang = match rng.gen_range(0..4) {
                    3 => None,
                    n => Some(key(SLUGS[n])),
                };
                kind.set_language(id, lang).unwrap();
            }
            1 | 2 => {
                let wanted = random_translations(rng, ids);
                kind.save_translations(id, &wanted).unwrap();
            }
            _ => kind.delete_translation(id).unwrap(),
        }
        check_groups(kind, min_members);
    }
}

#[test]
fn test_unassigned_page_gets_default_language() {
    let site = TestSite::new();
    let p1 = site.page("P1", None);
    assert_eq!(site.posts().get_objects_with_no_lang(0, None).unwrap(), vec![p1]);

    let assigned = site.objects().set_language_in_mass(None, 0).unwrap();
    assert_eq!(assigned, 1);
    assert_eq!(language_of(site.posts().as_ref(), p1).as_deref(), Some("en"));
    assert!(site.posts().get_objects_with_no_lang(0, None).unwrap().is_empty());
}

#[test]
fn test_translations_are_mutual() {
    let site = TestSite::new();
    let p1 = site.page("P1", Some("en"));
    let p2 = site.page("P2", Some("fr"));
    site.posts()
        .save_translations(p1, &translations(&[("en", p1), ("fr", p2)]))
        .unwrap();

    assert_eq!(site.posts().get_translation(p1, &key("fr")).unwrap(), p2);
    assert_eq!(site.posts().get_translation(p2, &key("en")).unwrap(), p1);
    assert_eq!(site.posts().get(p2, &key("fr")).unwrap(), p2);
}

#[test]
fn test_delete_translation_reads_the_same_for_both_kinds() {
    let site = TestSite::new();
    let p1 = site.page("P1", Some("en"));
    let p2 = site.page("P2", Some("fr"));
    site.posts()
        .save_translations(p1, &translations(&[("en", p1), ("fr", p2)]))
        .unwrap();
    let t1 = site.category("News", Some("en"));
    let t2 = site.category("Nouvelles", Some("fr"));
    site.terms()
        .save_translations(t1, &translations(&[("en", t1), ("fr", t2)]))
        .unwrap();

    site.posts().delete_translation(p1).unwrap();
    site.terms().delete_translation(t1).unwrap();

    assert_eq!(site.posts().get_translations(p2).unwrap(), translations(&[("fr", p2)]));
    assert_eq!(site.terms().get_translations(t2).unwrap(), translations(&[("fr", t2)]));

    assert!(site.posts().get_group(p2).unwrap().is_none());
    let placeholder = site.terms().get_group(t2).unwrap().expect("placeholder group");
    assert_eq!(placeholder.members, translations(&[("fr", t2)]));
    assert!(site.terms().get_group(t1).unwrap().is_none());
}

#[test]
fn test_language_change_destroys_collapsed_group() {
    let site = TestSite::new();
    let p1 = site.page("P1", Some("en"));
    let p2 = site.page("P2", Some("fr"));
    site.posts()
        .save_translations(p1, &translations(&[("en", p1), ("fr", p2)]))
        .unwrap();

    assert!(site.posts().set_language(p2, Some(key("en"))).unwrap());

    assert_eq!(site.posts().get_translations(p1).unwrap(), translations(&[("en", p1)]));
    assert_eq!(language_of(site.posts().as_ref(), p2).as_deref(), Some("en"));
    assert!(site.posts().get_group(p1).unwrap().is_none());
    assert!(site.posts().get_group(p2).unwrap().is_none());
}

#[test]
fn test_new_language_removes_object_from_other_keys() {
    let site = three_languages();
    let p1 = site.page("P1", Some("en"));
    let p2 = site.page("P2", Some("fr"));
    let p3 = site.page("P3", Some("de"));
    site.posts()
        .save_translations(p1, &translations(&[("en", p1), ("fr", p2), ("de", p3)]))
        .unwrap();

    site.posts().set_language(p3, Some(key("fr"))).unwrap();

    assert_eq!(language_of(site.posts().as_ref(), p3).as_deref(), Some("fr"));
    let seen_from_p1 = site.posts().get_translations(p1).unwrap();
    assert_eq!(seen_from_p1, translations(&[("en", p1), ("fr", p2)]));
    assert!(!seen_from_p1.values().any(|&id| id == p3));
}

#[test]
fn test_one_member_per_language() {
    let site = TestSite::new();
    let p1 = site.page("P1", Some("en"));
    let p2 = site.page("P2", Some("fr"));
    let p3 = site.page("P3", Some("fr"));
    site.posts()
        .save_translations(p1, &translations(&[("en", p1), ("fr", p2)]))
        .unwrap();
    site.posts()
        .save_translations(p1, &translations(&[("en", p1), ("fr", p3)]))
        .unwrap();

    assert_eq!(site.posts().get_translations(p1).unwrap(), translations(&[("en", p1), ("fr", p3)]));
    assert_eq!(site.posts().get_translation(p2, &key("en")).unwrap(), 0);
    assert!(site.posts().get_group(p2).unwrap().is_none());
    check_groups(site.posts().as_ref(), 2);
}

#[test]
fn test_saving_twice_changes_nothing() {
    let site = TestSite::new();
    let p1 = site.page("P1", Some("en"));
    let p2 = site.page("P2", Some("fr"));
    let wanted = translations(&[("en", p1), ("fr", p2)]);
    site.posts().save_translations(p1, &wanted).unwrap();
    let group = site.posts().get_group(p1).unwrap().unwrap();

    assert_eq!(site.posts().save_translations(p2, &wanted).unwrap(), wanted);
    assert_eq!(site.posts().get_group(p1).unwrap().unwrap(), group);
    assert!(!site.posts().set_language(p1, Some(key("en"))).unwrap());
}

#[test]
fn test_random_operations_keep_groups_consistent() {
    let site = three_languages();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let pages: Vec<i64> = (0..8)
        .map(|i| site.page(&format!("Page {i}"), Some(SLUGS[i % SLUGS.len()])))
        .collect();
    let categories: Vec<i64> = (0..8)
        .map(|i| site.category(&format!("Category {i}"), Some(SLUGS[i % SLUGS.len()])))
        .collect();

    random_ops(site.posts().as_ref(), &pages, &mut rng, 2);
    random_ops(site.terms().as_ref(), &categories, &mut rng, 1);
}

#[test]
fn test_round_trip_drops_exactly_the_mismatches() {
    let site = three_languages();
    let mut rng = StdRng::seed_from_u64(42);
    let mut languages: HashMap<i64, &str> = HashMap::new();
    for slug in SLUGS {
        for i in 0..3 {
            languages.insert(site.page(&format!("{slug} {i}"), Some(slug)), slug);
        }
    }
    let pages: Vec<i64> = {
        let mut ids: Vec<i64> = languages.keys().copied().collect();
        ids.sort_unstable();
        ids
    };

    for _ in 0..40 {
        let id = pages[rng.gen_range(0..pages.len())];
        let mut wanted = random_translations(&mut rng, &pages);
        if rng.gen_bool(0.2) {
            wanted.insert("xx".to_string(), pages[0]);
        }
        if rng.gen_bool(0.2) {
            wanted.insert("de".to_string(), -3);
        }

        let own = languages[&id];
        let mut expected: Translations = wanted
            .iter()
            .filter(|&(slug, &target)| {
                slug != own && target != id && languages.get(&target) == Some(&slug.as_str())
            })
            .map(|(slug, &target)| (slug.clone(), target))
            .collect();
        expected.insert(own.to_string(), id);

        assert_eq!(site.posts().save_translations(id, &wanted).unwrap(), expected);
        assert_eq!(site.posts().get_translations(id).unwrap(), expected);
    }
    check_groups(site.posts().as_ref(), 2);
}

#[test]
fn test_listing_counts_per_language() {
    let site = TestSite::new();
    for title in ["a", "b"] {
        site.page(title, Some("en"));
    }
    for title in ["c", "d", "e"] {
        site.page(title, Some("fr"));
    }
    site.page("untranslated", None);

    let count = |filter: LanguageFilter| -> i64 {
        let (join, predicate) = site.posts().language_clauses("p", &filter).unwrap();
        let sql = format!(
            "SELECT COUNT(*) AS n FROM {} AS p{join} WHERE p.post_type = 'page'{predicate}",
            site.tables().posts,
        );
        site.context().db().query_one(&sql, &[]).unwrap().get::<i64>("n").unwrap()
    };

    assert_eq!(count("en".into()), 2);
    assert_eq!(count("fr".into()), 3);
    assert_eq!(count("en,fr".into()), 5);
    assert_eq!(count("zz".into()), 6);
}

#[test]
fn test_deleting_default_language_promotes_next() {
    let site = three_languages();
    let p1 = site.page("P1", Some("en"));
    let p2 = site.page("P2", Some("fr"));
    site.posts()
        .save_translations(p1, &translations(&[("en", p1), ("fr", p2)]))
        .unwrap();

    let refused = site.objects().delete_language("en", DeletePolicy::Refuse);
    assert!(matches!(refused, Err(PolyglotError::Conflict(_))));
    assert!(site.languages().get("en").unwrap().is_some());

    assert!(site.objects().delete_language("en", DeletePolicy::Cascade).unwrap());
    let default = site.languages().get_default().unwrap().unwrap();
    assert_eq!(default.slug, "fr");
    assert!(site.posts().get_language(p1).unwrap().is_none());
    assert_eq!(site.posts().get_translations(p2).unwrap(), translations(&[("fr", p2)]));
    assert!(!site.objects().delete_language("en", DeletePolicy::Cascade).unwrap());
}
