use catalog_core::db::open_db_in_memory;
use catalog_core::{search_tags, TagSearchQuery, TagService, TagUpdate, TagView};
use rusqlite::Connection;

fn seed(conn: &mut Connection) -> Vec<TagView> {
    let updates = [
        TagUpdate::named("Shooter").with_aliases(["Shoot 'Em Up", "Shmup"]),
        TagUpdate::named("Puzzle").with_aliases(["Logic"]),
        TagUpdate::named("100% Completion"),
        TagUpdate::named("snake_case"),
    ];
    updates
        .iter()
        .map(|update| TagService::new(conn).create_tag(update).unwrap())
        .collect()
}

fn primary_names(views: &[TagView]) -> Vec<&str> {
    views.iter().map(|view| view.primary_alias.as_str()).collect()
}

#[test]
fn search_returns_each_tag_once_even_when_several_aliases_match() {
    let mut conn = open_db_in_memory().unwrap();
    let seeded = seed(&mut conn);

    let hits = search_tags(&conn, &TagSearchQuery::new("Sh")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0], seeded[0]);
}

#[test]
fn search_matches_synonyms_and_returns_full_views() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn);

    let hits = search_tags(&conn, &TagSearchQuery::new("ogi")).unwrap();
    assert_eq!(primary_names(&hits), vec!["Puzzle"]);
    assert_eq!(hits[0].aliases, vec!["Logic".to_string()]);
}

#[test]
fn search_is_ascii_case_insensitive_and_ordered_by_tag_id() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn);

    let hits = search_tags(&conn, &TagSearchQuery::new("E")).unwrap();
    assert_eq!(
        primary_names(&hits),
        vec!["Shooter", "Puzzle", "100% Completion", "snake_case"]
    );
}

#[test]
fn search_treats_like_wildcards_literally() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn);

    let percent = search_tags(&conn, &TagSearchQuery::new("%")).unwrap();
    assert_eq!(primary_names(&percent), vec!["100% Completion"]);

    let underscore = search_tags(&conn, &TagSearchQuery::new("_")).unwrap();
    assert_eq!(primary_names(&underscore), vec!["snake_case"]);
}

#[test]
fn blank_search_returns_every_tag() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn);

    let hits = search_tags(&conn, &TagSearchQuery::default()).unwrap();
    assert_eq!(hits.len(), 4);
}

#[test]
fn search_without_match_is_empty() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn);

    assert!(search_tags(&conn, &TagSearchQuery::new("Racing"))
        .unwrap()
        .is_empty());
}

#[test]
fn modified_after_filters_out_older_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let seeded = seed(&mut conn);
    conn.execute(
        "UPDATE tag SET date_modified = 1000 WHERE id != ?1;",
        [seeded[1].id],
    )
    .unwrap();
    conn.execute(
        "UPDATE tag SET date_modified = 5000 WHERE id = ?1;",
        [seeded[1].id],
    )
    .unwrap();

    let recent = search_tags(&conn, &TagSearchQuery::new("").with_modified_after(1000)).unwrap();
    assert_eq!(primary_names(&recent), vec!["Puzzle"]);

    let none = search_tags(&conn, &TagSearchQuery::new("").with_modified_after(5000)).unwrap();
    assert!(none.is_empty());

    let all = search_tags(&conn, &TagSearchQuery::new("o").with_modified_after(0)).unwrap();
    assert_eq!(all.len(), 3);
}
