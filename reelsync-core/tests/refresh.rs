mod support;

use reelsync_core::CatalogError;
use reelsync_model::{ItemId, MediaItemQuery, SourceId, StreamKind};
use support::*;

#[tokio::test]
async fn refreshing_user_views_populates_the_cached_list() {
    let remote = StubRemote::new();
    remote.set_list(
        MediaItemQuery::AllUserViews,
        vec![library("A", "A"), library("B", "B"), library("C", "C")],
    );
    let repository = repository(remote.clone()).await;

    repository
        .refresh_list(&MediaItemQuery::AllUserViews)
        .await
        .expect("refresh succeeds");

    let membership = repository.store().list_membership("AllUserViews").await;
    assert_eq!(
        membership,
        vec![ItemId::from("A"), ItemId::from("B"), ItemId::from("C")]
    );

    let mut views = repository.observe_list(&MediaItemQuery::AllUserViews);
    assert_eq!(names(&next(&mut views).await), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn live_subscribers_see_the_refresh() {
    let remote = StubRemote::new();
    let query = MediaItemQuery::ChildrenOf {
        parent_id: ItemId::from("lib"),
    };
    remote.set_list(
        query.clone(),
        vec![movie("m1", "Heat"), movie("m2", "Ronin")],
    );
    let repository = repository(remote.clone()).await;

    let mut children = repository.observe_list(&query);
    assert!(next(&mut children).await.is_empty());

    repository.refresh_list(&query).await.expect("refresh");
    assert_eq!(names(&next(&mut children).await), vec!["Heat", "Ronin"]);

    // Membership is replaced wholesale, never patched
    remote.set_list(query.clone(), vec![movie("m3", "Thief")]);
    repository.refresh_list(&query).await.expect("refresh");
    assert_eq!(names(&next(&mut children).await), vec!["Thief"]);
}

#[tokio::test]
async fn a_batch_is_one_round_trip() {
    let remote = StubRemote::new();
    remote.set_list(MediaItemQuery::Resume, vec![movie("m1", "Heat")]);
    remote.set_list(
        MediaItemQuery::NextUp { series_id: None },
        vec![movie("e1", "Pilot")],
    );
    let repository = repository(remote.clone()).await;

    repository
        .refresh_lists(&[
            MediaItemQuery::Resume,
            MediaItemQuery::NextUp { series_id: None },
            MediaItemQuery::Resume,
        ])
        .await
        .expect("refresh");

    assert_eq!(remote.batch_calls(), 1);
    assert_eq!(repository.store().list_membership("Resume").await.len(), 1);
    assert_eq!(repository.store().list_membership("NextUp").await.len(), 1);
}

#[tokio::test]
async fn incomplete_batches_write_nothing() {
    let remote = StubRemote::new();
    remote.set_list(MediaItemQuery::Resume, vec![movie("m1", "Heat")]);
    let repository = repository(remote.clone()).await;

    let err = repository
        .refresh_lists(&[MediaItemQuery::Resume, MediaItemQuery::Favorites])
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Unknown(_)));
    assert!(repository.store().list_membership("Resume").await.is_empty());
}

#[tokio::test]
async fn server_errors_surface_as_http_errors() {
    let remote = StubRemote::new();
    remote.fail_with(Some(CatalogError::Http {
        code: 503,
        message: "Service Unavailable".into(),
    }));
    let repository = repository(remote.clone()).await;

    let err = repository
        .refresh_list(&MediaItemQuery::AllUserViews)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CatalogError::Http {
            code: 503,
            message: "Service Unavailable".into()
        }
    );
}

#[tokio::test]
async fn refreshing_an_item_stores_its_sources() {
    let remote = StubRemote::new();
    remote.set_details(
        movie("m1", "Heat"),
        vec![source(
            "s1",
            "m1",
            vec![
                stream(0, StreamKind::Video, "und"),
                stream(1, StreamKind::Audio, "eng"),
                stream(2, StreamKind::Subtitle, "fra"),
            ],
        )],
    );
    let repository = repository(remote.clone()).await;
    let id = ItemId::from("m1");

    let mut item = repository.observe_item(&id);
    assert_eq!(next(&mut item).await, None);

    repository.refresh_item(&id).await.expect("refresh");
    assert_eq!(
        next(&mut item).await.map(|i| i.name),
        Some("Heat".to_string())
    );

    let source = repository
        .get_source(&SourceId::from("s1"))
        .await
        .expect("source cached");
    assert_eq!(source.streams.len(), 3);

    let mut options = repository.observe_stream_options(&id);
    let options = next(&mut options).await.expect("primary source");
    assert_eq!(options.default_audio_index, Some(1));
    assert_eq!(options.subtitles.len(), 1);
}

#[tokio::test]
async fn missing_items_report_not_found() {
    let repository = repository(StubRemote::new()).await;
    let err = repository.refresh_item(&ItemId::from("nope")).await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn concurrent_refreshes_of_one_key_leave_one_complete_list() {
    let remote = StubRemote::new();
    remote.set_list(
        MediaItemQuery::Favorites,
        (0..20)
            .map(|i| movie(&format!("m{i}"), &format!("Movie {i}")))
            .collect(),

    );
    let repository = repository(remote.clone()).await;

    let (a, b) = tokio::join!(
        repository.refresh_list(&MediaItemQuery::Favorites),
        repository.refresh_list(&MediaItemQuery::Favorites),
    );
    a.expect("first refresh");
    b.expect("second refresh");

    assert_eq!(repository.store().list_membership("Favorites").await.len(), 20);
}
