//! Integration tests for the storage substrate: the stores of two sites
//! sharing one database, and the query fragments the engine splices into
//! listing queries.

use std::sync::Arc;

use polyglot_rs_core::LastChanged;
use polyglot_rs_db::{
    install, ContentStore, DbExecutor, LinkMode, NewTerm, Post, SqliteBackend, TaxonomyStore,
    Tables, Value, POSTS_GROUP, TERMS_GROUP,
};

struct Site {
    taxonomy: TaxonomyStore,
    content: ContentStore,
    tables: Tables,
}

fn site(db: &Arc<dyn DbExecutor>, tokens: &LastChanged, site_id: u64) -> Site {
    let tables = Tables::for_site("wp_", site_id);
    install(db.as_ref(), &tables).unwrap();
    Site {
        taxonomy: TaxonomyStore::new(Arc::clone(db), tables.clone(), tokens.clone()),
        content: ContentStore::new(Arc::clone(db), tables.clone(), tokens.clone()),
        tables,
    }
}

#[test]
fn test_sites_are_isolated_in_one_database() {
    let db: Arc<dyn DbExecutor> = Arc::new(SqliteBackend::memory().unwrap());
    let tokens = LastChanged::new();
    let main = site(&db, &tokens, 1);
    let second = site(&db, &tokens, 2);

    main.taxonomy
        .insert_term("language", &NewTerm::new("English").slug("en"))
        .unwrap();
    assert!(second.taxonomy.get_terms("language").unwrap().is_empty());

    // The same slug is free on the other site.
    second
        .taxonomy
        .insert_term("language", &NewTerm::new("English").slug("en"))
        .unwrap();
}

#[test]
fn test_tokens_are_per_site() {
    let db: Arc<dyn DbExecutor> = Arc::new(SqliteBackend::memory().unwrap());
    let tokens = LastChanged::new();
    let main = site(&db, &tokens, 1);
    let second = site(&db, &tokens, 2);

    let main_terms = tokens.get(1, TERMS_GROUP);
    let main_posts = tokens.get(1, POSTS_GROUP);
    second.content.insert_post(&Post::new("post", "x")).unwrap();
    second
        .taxonomy
        .insert_term("category", &NewTerm::new("x"))
        .unwrap();
    assert_eq!(tokens.get(1, TERMS_GROUP), main_terms);
    assert_eq!(tokens.get(1, POSTS_GROUP), main_posts);

    main.content.insert_post(&Post::new("post", "y")).unwrap();
    assert!(tokens.get(1, POSTS_GROUP) > main_posts);
}

#[test]
fn test_language_join_filters_posts() {
    let db: Arc<dyn DbExecutor> = Arc::new(SqliteBackend::memory().unwrap());
    let tokens = LastChanged::new();
    let main = site(&db, &tokens, 1);

    let en = main
        .taxonomy
        .insert_term("language", &NewTerm::new("English").slug("en"))
        .unwrap();
    let fr = main
        .taxonomy
        .insert_term("language", &NewTerm::new("Français").slug("fr"))
        .unwrap();
    let mut ids = Vec::new();
    for title in ["a", "b", "c"] {
        ids.push(main.content.insert_post(&Post::new("post", title)).unwrap());
    }
    main.taxonomy
        .add_objects_to_term(&ids[..2], en.term_taxonomy_id)
        .unwrap();
    main.taxonomy
        .set_object_terms(ids[2], "language", &[fr.term_taxonomy_id], LinkMode::Replace)
        .unwrap();

    let sql = format!(
        "SELECT COUNT(*) AS n FROM {posts} AS p \
         INNER JOIN {tr} AS pll_tr ON pll_tr.object_id = p.ID \
         WHERE 1=1 AND pll_tr.term_taxonomy_id IN (?)",
        posts = main.tables.posts,
        tr = main.tables.term_relationships,
    );
    let n: i64 = db
        .query_one(&sql, &[Value::Int(en.term_taxonomy_id)])
        .unwrap()
        .get("n")
        .unwrap();
    assert_eq!(n, 2);
}
