mod support;

use reelsync_model::{ItemId, SourceId, StreamKind};
use support::*;

fn two_versions() -> Vec<reelsync_model::MediaItemSource> {
    vec![
        source(
            "s-4k",
            "m1",
            vec![
                stream(0, StreamKind::Video, "und"),
                stream(1, StreamKind::Audio, "eng"),
            ],
        ),
        source(
            "s-hd",
            "m1",
            vec![
                stream(0, StreamKind::Video, "und"),
                stream(1, StreamKind::Audio, "deu"),
                stream(2, StreamKind::Audio, "eng"),
                stream(3, StreamKind::Subtitle, "eng"),
            ],
        ),
    ]
}

#[tokio::test]
async fn nothing_to_offer_until_a_source_is_cached() {
    let remote = StubRemote::new();
    remote.set_details(movie("m1", "Heat"), two_versions());
    let repository = repository(remote.clone()).await;
    let id = ItemId::from("m1");

    let mut options = repository.observe_stream_options(&id);
    assert_eq!(next(&mut options).await, None);

    repository.refresh_item(&id).await.expect("refresh");
    let first = next(&mut options).await.expect("primary source");
    assert_eq!(first.source_id, SourceId::from("s-4k"));
    assert_eq!(first.audio.len(), 1);
}

#[tokio::test]
async fn switching_the_primary_source_switches_the_options() {
    let remote = StubRemote::new();
    remote.set_details(movie("m1", "Heat"), two_versions());
    let repository = repository(remote.clone()).await;
    let id = ItemId::from("m1");
    repository.refresh_item(&id).await.expect("refresh");

    let mut options = repository.observe_stream_options(&id);
    let first = next(&mut options).await.expect("primary source");
    assert_eq!(first.source_id, SourceId::from("s-4k"));

    assert!(
        repository
            .select_primary_source(&id, &SourceId::from("s-hd"))
            .await
    );
    let switched = next(&mut options).await.expect("new primary");
    assert_eq!(switched.source_id, SourceId::from("s-hd"));
    assert_eq!(switched.audio.len(), 2);
    assert_eq!(switched.subtitles.len(), 1);
    assert_quiet(&mut options).await;
}

#[tokio::test]
async fn the_old_source_is_not_followed_after_a_switch() {
    let remote = StubRemote::new();
    remote.set_details(movie("m1", "Heat"), two_versions());
    let repository = repository(remote.clone()).await;
    let id = ItemId::from("m1");
    repository.refresh_item(&id).await.expect("refresh");

    let mut options = repository.observe_stream_options(&id);
    next(&mut options).await;
    repository
        .select_primary_source(&id, &SourceId::from("s-hd"))
        .await;
    let switched = next(&mut options).await.expect("new primary");
    assert_eq!(switched.source_id, SourceId::from("s-hd"));

    // Rewriting the previous primary must not leak into this subscription
    let mut versions = two_versions();
    versions[0].streams.push(stream(2, StreamKind::Subtitle, "spa"));
    remote.set_details(movie("m1", "Heat"), versions);
    repository.refresh_item(&id).await.expect("refresh");

    assert_quiet(&mut options).await;
}

#[tokio::test]
async fn unknown_sources_are_rejected() {
    let remote = StubRemote::new();
    remote.set_details(movie("m1", "Heat"), two_versions());
    remote.set_details(
        movie("m2", "Ronin"),
        vec![source(
            "s-other",
            "m2",
            vec![stream(0, StreamKind::Video, "und")],
        )],

    );
    let repository = repository(remote.clone()).await;
    let id = ItemId::from("m1");
    repository.refresh_item(&id).await.expect("refresh");
    repository
        .refresh_item(&ItemId::from("m2"))
        .await
        .expect("refresh");

    assert!(
        !repository
            .select_primary_source(&id, &SourceId::from("s-other"))
            .await
    );
    assert!(
        !repository
            .select_primary_source(&id, &SourceId::from("missing"))
            .await
    );

    let mut options = repository.observe_stream_options(&id);
    let current = next(&mut options).await.expect("primary source");
    assert_eq!(current.source_id, SourceId::from("s-4k"));
}

#[tokio::test]
async fn subscribers_share_one_feed() {
    let remote = StubRemote::new();
    remote.set_details(movie("m1", "Heat"), two_versions());
    let repository = repository(remote.clone()).await;
    let id = ItemId::from("m1");
    repository.refresh_item(&id).await.expect("refresh");

    let mut a = repository.observe_stream_options(&id);
    let mut b = repository.observe_stream_options(&id);
    assert_eq!(next(&mut a).await, next(&mut b).await);
}
