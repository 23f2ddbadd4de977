//! Integration tests for gallery-kit
//!
//! These tests drive the `Gallery` facade against `InMemoryGallery` and check
//! the cache, pagination and mutation behavior end to end.

use gallery_kit::key::{kinds, params};
use gallery_kit::{
    Album, AlbumCreate, AlbumUpdate, Credentials, Error, Gallery, GalleryApi, InMemoryGallery,
    MemoryTokenStore, Page, PageData, Photo, PhotoCreate, QueryKey, Scope, TokenStore, User,
    UserRegister,
};
use std::sync::Arc;
use std::time::Duration;

const PASSWORD: &str = "secret123";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup() -> (Gallery, Arc<InMemoryGallery>) {
    init_logging();
    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    let api = Arc::new(InMemoryGallery::with_tokens(tokens.clone()));
    let gallery = Gallery::new(api.clone(), tokens);
    (gallery, api)
}

async fn login(gallery: &Gallery, user: &User) {
    gallery
        .login(&Credentials::new(user.email.clone(), PASSWORD))
        .await
        .expect("login should succeed");
}

fn is_stale<T: serde::de::DeserializeOwned>(gallery: &Gallery, key: &QueryKey) -> bool {
    gallery
        .cache()
        .get::<PageData<T>>(key)
        .map(|entry| entry.is_stale)
        .unwrap_or(false)
}

/// Test 1: Two Pages of Albums
///
/// 25 albums with a page size of 20:
/// - page 1 is full, so there may be a next page
/// - page 2 holds the remaining 5 and is the last
#[tokio::test]
async fn test_albums_paginate_across_two_pages() {
    let (gallery, api) = setup();
    let owner = api.seed_user("jane@example.com", PASSWORD);
    for i in 0..25 {
        api.seed_album(&owner.id, &format!("Album {}", i));
    }

    let albums = gallery.albums();

    let first = gallery.load(&albums, 1).await;
    assert!(first.error.is_none());
    assert_eq!(first.items.len(), 20);
    assert!(first.has_next_page);
    assert!(!first.has_previous_page);

    let second = gallery.load(&albums, 2).await;
    assert_eq!(second.items.len(), 5);
    assert!(!second.has_next_page);
    assert!(second.has_previous_page);

    // Page 2 came from the prefetch started by page 1.
    assert_eq!(api.calls("list_albums"), 2);
}

/// Test 2: Request De-duplication
///
/// Concurrent loads of the same page share one request.
#[tokio::test]
async fn test_concurrent_loads_share_one_request() {
    let (gallery, api) = setup();
    let owner = api.seed_user("jane@example.com", PASSWORD);
    for i in 0..3 {
        api.seed_album(&owner.id, &format!("Album {}", i));
    }
    api.set_latency(Duration::from_millis(30));

    let albums = gallery.albums();
    let (a, b) = tokio::join!(gallery.load(&albums, 1), gallery.load(&albums, 1));

    assert_eq!(a.items, b.items);
    assert_eq!(a.items.len(), 3);
    assert_eq!(api.calls("list_albums"), 1);
}

/// Test 3: Prefetch Does Not Block
///
/// `load` returns page 1 while page 2 is still loading in the background.
#[tokio::test]
async fn test_prefetch_does_not_block_current_page() {
    let (gallery, api) = setup();
    let owner = api.seed_user("jane@example.com", PASSWORD);
    for i in 0..30 {
        api.seed_album(&owner.id, &format!("Album {}", i));
    }
    api.set_latency(Duration::from_millis(20));

    let albums = gallery.albums();
    let first = gallery.load(&albums, 1).await;

    assert!(first.has_next_page);
    assert!(gallery.cache().is_fetching(&albums.key(Page::new(2))));

    let second = gallery.load(&albums, 2).await;
    assert_eq!(second.items.len(), 10);
    assert_eq!(api.calls("list_albums"), 2);
}

/// Test 4: Invalidation Forces a Refetch
#[tokio::test]
async fn test_invalidation_forces_refetch() {
    let (gallery, api) = setup();
    api.seed_user("jane@example.com", PASSWORD);

    let users = gallery.users();
    gallery.load(&users, 1).await;
    gallery.load(&users, 1).await;
    assert_eq!(api.calls("list_users"), 1, "second load is a cache hit");

    let matched = gallery
        .cache()
        .invalidate(&gallery_kit::KeyPredicate::resource(kinds::USERS));
    assert_eq!(matched, 1);

    api.seed_user("bob@example.com", PASSWORD);
    let refreshed = gallery.load(&users, 1).await;
    assert_eq!(api.calls("list_users"), 2);
    assert_eq!(refreshed.items.len(), 2);
}

/// Test 5: Mutation Invalidation Scope
///
/// Creating an album for Jane marks every "albums" page and Jane's
/// "user_albums" pages stale, but not Bob's albums or any photos.
#[tokio::test]
async fn test_create_album_invalidates_owner_scope_only() {
    let (gallery, api) = setup();
    let jane = api.seed_user("jane@example.com", PASSWORD);
    let bob = api.seed_user("bob@example.com", PASSWORD);
    let album = api.seed_album(&jane.id, "Existing");
    api.seed_photo(&album.id, "Beach").expect("album exists");
    login(&gallery, &jane).await;

    let all = gallery.albums();
    let janes = gallery.user_albums(&jane.id);
    let bobs = gallery.user_albums(&bob.id);
    let photos = gallery.photos();
    gallery.load(&all, 1).await;
    gallery.load(&janes, 1).await;
    gallery.load(&bobs, 1).await;
    gallery.load(&photos, 1).await;

    let created = gallery
        .create_album(&AlbumCreate {
            title: "Trip".to_string(),
            ..Default::default()
        })
        .await
        .expect("create album");
    assert_eq!(created.owner_id, jane.id);

    assert!(is_stale::<Album>(&gallery, &all.key(Page::FIRST)));
    assert!(is_stale::<Album>(&gallery, &janes.key(Page::FIRST)));
    assert!(!is_stale::<Album>(&gallery, &bobs.key(Page::FIRST)));
    assert!(!is_stale::<Photo>(&gallery, &photos.key(Page::FIRST)));

    let reloaded = gallery.load(&janes, 1).await;
    assert_eq!(reloaded.items.len(), 2);
}

/// Test 6: Deleted Photo Disappears
#[tokio::test]
async fn test_deleted_photo_is_gone_from_next_load() {
    let (gallery, api) = setup();
    let jane = api.seed_user("jane@example.com", PASSWORD);
    let album = api.seed_album(&jane.id, "Trip");
    for title in ["Beach", "Dunes", "Harbor"] {
        api.seed_photo(&album.id, title).expect("album exists");
    }
    login(&gallery, &jane).await;

    let photos = gallery.album_photos(&jane.id, &album.id);
    let before = gallery.load(&photos, 1).await;
    assert!(before.items.iter().any(|p| p.id == "p1"));

    gallery.delete_photo("p1").await.expect("delete photo");

    let after = gallery.load(&photos, 1).await;
    assert!(after.error.is_none());
    assert!(after.items.iter().all(|p| p.id != "p1"));
    assert_eq!(after.items.len(), 2);
}

/// Test 7: Failed Mutation Leaves the Cache Alone
#[tokio::test]
async fn test_failed_mutation_invalidates_nothing() {
    let (gallery, api) = setup();
    let jane = api.seed_user("jane@example.com", PASSWORD);
    login(&gallery, &jane).await;

    let albums = gallery.albums();
    gallery.load(&albums, 1).await;

    api.fail_next("create_album", Error::Network("connection reset".to_string()));
    let result = gallery
        .create_album(&AlbumCreate {
            title: "Trip".to_string(),
            ..Default::default()
        })
        .await;

    let err = result.expect_err("mutation should fail");
    assert!(err.is_retryable());
    assert_eq!(err.user_message(), "Something went wrong.");
    assert!(!is_stale::<Album>(&gallery, &albums.key(Page::FIRST)));
    assert!(!gallery.mutator().is_pending());
}

/// Test 8: Form Rules Run Before the Network
#[tokio::test]
async fn test_invalid_forms_never_reach_the_server() {
    let (gallery, api) = setup();

    let err = gallery
        .create_album(&AlbumCreate::default())
        .await
        .expect_err("blank title");
    assert_eq!(err.user_message(), "Please include the album title");

    let err = gallery
        .create_photo(
            "a1",
            &PhotoCreate {
                photo_title: "Sunset".to_string(),
                image_url: String::new(),
            },
        )
        .await
        .expect_err("missing url");
    assert_eq!(err.user_message(), "Please add a photo image URL");

    let err = gallery
        .login(&Credentials::new("", ""))
        .await
        .expect_err("blank credentials");
    assert!(matches!(err, Error::Validation { ref fields } if fields.len() == 2));

    assert_eq!(api.total_calls(), 0);
}

/// Test 9: Failed Page Load
///
/// The error is reported in the page state and the next load retries.
#[tokio::test]
async fn test_failed_page_reports_error_then_recovers() {
    let (gallery, api) = setup();
    api.seed_user("jane@example.com", PASSWORD);
    api.fail_next("list_users", Error::Network("timeout".to_string()));

    let users = gallery.users();
    let failed = gallery.load(&users, 1).await;
    assert!(!failed.is_loading);
    assert!(failed.items.is_empty());
    assert!(failed.is_error());

    let recovered = gallery.load(&users, 1).await;
    assert!(recovered.error.is_none());
    assert_eq!(recovered.items.len(), 1);
    assert_eq!(api.calls("list_users"), 2);
}

/// Test 10: Session Lifecycle
#[tokio::test]
async fn test_session_login_and_logout() {
    let (gallery, api) = setup();
    let jane = api.seed_user("jane@example.com", PASSWORD);

    assert!(!gallery.is_logged_in().await);
    assert_eq!(gallery.current_user().await.expect("anonymous"), None);
    assert_eq!(api.calls("current_user"), 0);

    let bad = gallery
        .login(&Credentials::new("jane@example.com", "wrong-password"))
        .await
        .expect_err("wrong password");
    assert_eq!(bad.user_message(), "Incorrect email or password");
    assert!(!gallery.is_logged_in().await);

    login(&gallery, &jane).await;
    assert!(gallery.is_logged_in().await);
    let me = gallery.current_user().await.expect("me");
    assert_eq!(me.map(|u| u.id), Some(jane.id.clone()));

    gallery.logout().await.expect("logout");
    assert!(!gallery.is_logged_in().await);
    assert_eq!(gallery.current_user().await.expect("anonymous"), None);
}

/// Test 11: Cached Details Refresh After Edits
#[tokio::test]
async fn test_album_detail_refreshes_after_update() {
    let (gallery, api) = setup();
    let jane = api.seed_user("jane@example.com", PASSWORD);
    let album = api.seed_album(&jane.id, "Trip");
    login(&gallery, &jane).await;

    assert_eq!(gallery.album(&album.id).await.expect("album").title, "Trip");
    gallery.album(&album.id).await.expect("album");
    assert_eq!(api.calls("get_album"), 1);

    gallery
        .update_album(
            &album.id,
            &AlbumUpdate {
                title: Some("Road trip".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(
        gallery.album(&album.id).await.expect("album").title,
        "Road trip"
    );
    assert_eq!(api.calls("get_album"), 2);

    let missing = gallery.album("a404").await.expect_err("missing");
    assert_eq!(missing, Error::NotFound("Album not found".to_string()));
}

/// Test 12: Photo Detail
#[tokio::test]
async fn test_photo_detail_and_update() {
    let (gallery, api) = setup();
    let jane = api.seed_user("jane@example.com", PASSWORD);
    let album = api.seed_album(&jane.id, "Trip");
    let photo = api.seed_photo(&album.id, "Beach").expect("album exists");
    login(&gallery, &jane).await;

    let loaded = gallery
        .photo(&jane.id, &album.id, &photo.id)
        .await
        .expect("photo");
    assert_eq!(loaded.photo_title, "Beach");

    gallery
        .update_photo(
            &photo.id,
            &gallery_kit::PhotoUpdate {
                photo_title: Some("Sunset".to_string()),
                image_url: None,
            },
        )
        .await
        .expect("update");

    let key = QueryKey::new(kinds::PHOTO)
        .param(params::USER_ID, &jane.id)
        .param(params::ALBUM_ID, &album.id)
        .param(params::PHOTO_ID, &photo.id);
    let entry = gallery.cache().get::<Photo>(&key).expect("cached");
    assert!(entry.is_stale);
    assert_eq!(entry.value.map(|p| p.photo_title).as_deref(), Some("Beach"));

    let reloaded = gallery
        .photo(&jane.id, &album.id, &photo.id)
        .await
        .expect("photo");
    assert_eq!(reloaded.photo_title, "Sunset");
}

/// Test 13: Album Counts per User
#[tokio::test]
async fn test_album_counts_per_user() {
    let (gallery, api) = setup();
    let jane = api.seed_user("jane@example.com", PASSWORD);
    let bob = api.seed_user("bob@example.com", PASSWORD);
    let carol = api.seed_user("carol@example.com", PASSWORD);
    for i in 0..23 {
        api.seed_album(&jane.id, &format!("Jane {}", i));
    }
    api.seed_album(&bob.id, "Bob");

    let ids = vec![jane.id.clone(), bob.id.clone(), carol.id.clone()];
    let counts = gallery.album_counts(&ids).await.expect("counts");

    let pairs: Vec<_> = counts.iter().map(|c| (c.user_id.as_str(), c.count)).collect();
    assert_eq!(
        pairs,
        vec![(jane.id.as_str(), 23), (bob.id.as_str(), 1), (carol.id.as_str(), 0)]
    );

    let calls = api.calls("list_user_albums");
    gallery.album_counts(&ids).await.expect("cached counts");
    assert_eq!(api.calls("list_user_albums"), calls);
}

/// Test 14: Sign-up
#[tokio::test]
async fn test_register_invalidates_user_list() {
    let (gallery, api) = setup();
    api.seed_user("jane@example.com", PASSWORD);

    let users = gallery.users();
    assert_eq!(gallery.load(&users, 1).await.items.len(), 1);

    let form = UserRegister {
        email: "bob@example.com".to_string(),
        password: "longenough".to_string(),
        name: Some("Bob Stone".to_string()),
        username: Some("bob".to_string()),
        avatar: None,
    };

    let mismatch = gallery
        .register(&form, "different")
        .await
        .expect_err("confirmation differs");
    assert_eq!(mismatch.user_message(), "The passwords do not match");

    let bob = gallery.register(&form, "longenough").await.expect("register");
    assert_eq!(bob.username, "bob");
    assert!(is_stale::<User>(&gallery, &users.key(Page::FIRST)));
    assert_eq!(gallery.load(&users, 1).await.items.len(), 2);

    let duplicate = gallery
        .register(&form, "longenough")
        .await
        .expect_err("email taken");
    assert!(matches!(duplicate, Error::Api { status: 400, .. }));
}

/// Test 15: Page Cursor Over a Scoped List
#[tokio::test]
async fn test_cursor_walks_album_photos() {
    let (gallery, api) = setup();
    let jane = api.seed_user("jane@example.com", PASSWORD);
    let album = api.seed_album(&jane.id, "Trip");
    for i in 0..10 {
        api.seed_photo(&album.id, &format!("Photo{}", i))
            .expect("album exists");
    }

    let query = gallery.album_photos(&jane.id, &album.id);
    assert_eq!(
        query.key(Page::new(2)).scope(),
        &Scope::new()
            .with(params::USER_ID, &jane.id)
            .with(params::ALBUM_ID, &album.id)
            .with(params::PAGE, 2)
    );

    let cursor = gallery.cursor(query);
    let first = cursor.load().await.expect("current page");
    assert_eq!(first.items.len(), 8);
    assert!(first.has_next_page);

    cursor.next_page();
    let second = cursor.load().await.expect("current page");
    assert_eq!(second.items.len(), 2);
    assert!(!second.has_next_page);

    cursor.set_page(0);
    assert_eq!(cursor.page(), Page::FIRST);
    assert_eq!(cursor.snapshot().items.len(), 8);
}

/// Test 16: Deleting an Album Drops Its Photos
#[tokio::test]
async fn test_delete_album_invalidates_photo_lists() {
    let (gallery, api) = setup();
    let jane = api.seed_user("jane@example.com", PASSWORD);
    let album = api.seed_album(&jane.id, "Trip");
    api.seed_photo(&album.id, "Beach").expect("album exists");
    login(&gallery, &jane).await;

    let photos = gallery.photos();
    assert_eq!(gallery.load(&photos, 1).await.items.len(), 1);

    gallery.delete_album(&album.id).await.expect("delete");

    assert!(gallery.load(&photos, 1).await.items.is_empty());
    assert!(gallery.load(&gallery.albums(), 1).await.items.is_empty());
    assert_eq!(api.get_album(&album.id).await, Err(Error::NotFound("Album not found".to_string())));
}

/// Test 17: Album Counts Follow Album Mutations
#[tokio::test]
async fn test_album_counts_refresh_after_album_changes() {
    let (gallery, api) = setup();
    let jane = api.seed_user("jane@example.com", PASSWORD);
    login(&gallery, &jane).await;
    let ids = vec![jane.id.clone()];

    let count = |counts: Vec<gallery_kit::AlbumCount>| counts[0].count;
    assert_eq!(count(gallery.album_counts(&ids).await.expect("counts")), 0);

    let album = gallery
        .create_album(&AlbumCreate {
            title: "Trip".to_string(),
            ..Default::default()
        })
        .await
        .expect("create");
    assert_eq!(count(gallery.album_counts(&ids).await.expect("counts")), 1);

    gallery.delete_album(&album.id).await.expect("delete");
    assert_eq!(count(gallery.album_counts(&ids).await.expect("counts")), 0);
}
