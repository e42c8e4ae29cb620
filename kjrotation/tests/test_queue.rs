mod common;

use common::{assert_dense, open_session};
use kjrotation::{AddPolicy, Error, QueueSongId, Rotation, SingerId, SongId};

fn session_with_singer() -> (Rotation, SingerId) {
    let mut rotation = open_session();
    let alice = rotation.add_singer("Alice", AddPolicy::Bottom).unwrap();
    (rotation, alice)
}

fn song_ids(rotation: &Rotation, singer: SingerId) -> Vec<i64> {
    rotation
        .queue(singer)
        .unwrap()
        .iter()
        .map(|s| s.song_id.0)
        .collect()
}

fn queue_positions(rotation: &Rotation, singer: SingerId) -> Vec<usize> {
    rotation
        .queue(singer)
        .unwrap()
        .iter()
        .map(|s| s.position)
        .collect()
}

#[test]
fn test_add_song_appends_by_default() {
    let (mut rotation, alice) = session_with_singer();

    rotation.add_song(alice, SongId(1), None).unwrap();
    rotation.add_song(alice, SongId(2), None).unwrap();

    assert_eq!(song_ids(&rotation, alice), vec![1, 2]);
    assert_eq!(queue_positions(&rotation, alice), vec![0, 1]);
}

#[test]
fn test_add_song_at_position_shifts_followers() {
    let (mut rotation, alice) = session_with_singer();
    rotation.add_song(alice, SongId(1), None).unwrap();
    rotation.add_song(alice, SongId(2), None).unwrap();

    // Insertion en tête : tout le monde recule d'un cran
    rotation.add_song(alice, SongId(3), Some(0)).unwrap();
    assert_eq!(song_ids(&rotation, alice), vec![3, 1, 2]);
    assert_dense(&queue_positions(&rotation, alice));

    // Position au-delà de la fin : bornée à l'ajout en queue
    rotation.add_song(alice, SongId(4), Some(99)).unwrap();
    assert_eq!(song_ids(&rotation, alice), vec![3, 1, 2, 4]);
}

#[test]
fn test_add_song_requires_known_singer_and_song() {
    let (mut rotation, alice) = session_with_singer();

    assert!(matches!(
        rotation.add_song(SingerId(9999), SongId(1), None),
        Err(Error::UnknownSinger(_))
    ));
    assert!(matches!(
        rotation.add_song(alice, SongId(9999), None),
        Err(Error::UnknownSong(_))
    ));
    assert!(rotation.queue(alice).unwrap().is_empty());
}

#[test]
fn test_move_song_last_to_front() {
    // Scénario : file [S1@0, S2@1, S3@2], déplacement (2, 0) -> [S3, S1, S2]
    let (mut rotation, alice) = session_with_singer();
    for song in [1, 2, 3] {
        rotation.add_song(alice, SongId(song), None).unwrap();
    }

    rotation.move_song(alice, 2, 0).unwrap();

    assert_eq!(song_ids(&rotation, alice), vec![3, 1, 2]);
    assert_eq!(queue_positions(&rotation, alice), vec![0, 1, 2]);
}

#[test]
fn test_move_song_inverse_restores_order() {
    let (mut rotation, alice) = session_with_singer();
    for song in [1, 2, 3, 4] {
        rotation.add_song(alice, SongId(song), None).unwrap();
    }

    rotation.move_song(alice, 1, 3).unwrap();
    assert_eq!(song_ids(&rotation, alice), vec![1, 3, 4, 2]);
    rotation.move_song(alice, 3, 1).unwrap();
    assert_eq!(song_ids(&rotation, alice), vec![1, 2, 3, 4]);
}

#[test]
fn test_move_song_validates_positions() {
    let (mut rotation, alice) = session_with_singer();
    rotation.add_song(alice, SongId(1), None).unwrap();

    assert!(matches!(
        rotation.move_song(alice, 0, 3),
        Err(Error::PositionOutOfRange { position: 3, len: 1 })
    ));
    // Déplacement sur place : sans effet
    rotation.move_song(alice, 0, 0).unwrap();
    assert_eq!(song_ids(&rotation, alice), vec![1]);
}

#[test]
fn test_delete_song_compacts_queue() {
    let (mut rotation, alice) = session_with_singer();
    let mut ids = Vec::new();
    for song in [1, 2, 3] {
        ids.push(rotation.add_song(alice, SongId(song), None).unwrap());
    }

    rotation.delete_song(alice, ids[1]).unwrap();

    assert_eq!(song_ids(&rotation, alice), vec![1, 3]);
    assert_eq!(queue_positions(&rotation, alice), vec![0, 1]);
    assert!(matches!(
        rotation.delete_song(alice, ids[1]),
        Err(Error::UnknownQueueSong(_))
    ));
}

#[test]
fn test_set_played_and_next_unplayed() {
    let (mut rotation, alice) = session_with_singer();
    let first = rotation.add_song(alice, SongId(1), None).unwrap();
    let second = rotation.add_song(alice, SongId(2), None).unwrap();

    assert_eq!(rotation.next_unplayed(alice).unwrap().unwrap().id, first);

    rotation.set_played(alice, first, true).unwrap();
    assert_eq!(rotation.next_unplayed(alice).unwrap().unwrap().id, second);
    // Idempotent, la position ne bouge pas
    rotation.set_played(alice, first, true).unwrap();
    assert_eq!(queue_positions(&rotation, alice), vec![0, 1]);

    rotation.set_played(alice, second, true).unwrap();
    assert!(rotation.next_unplayed(alice).unwrap().is_none());

    // Re-filer la première : elle redevient la prochaine
    rotation.set_played(alice, first, false).unwrap();
    assert_eq!(rotation.next_unplayed(alice).unwrap().unwrap().id, first);
}

#[test]
fn test_playback_collaborators() {
    let mut rotation = open_session();
    let alice = rotation.add_singer("Alice", AddPolicy::Bottom).unwrap();
    let bob = rotation.add_singer("Bob", AddPolicy::Bottom).unwrap();
    rotation.add_song(alice, SongId(1), None).unwrap();
    rotation.add_song(bob, SongId(2), None).unwrap();

    // Sans chanteur courant, rien à lancer
    assert!(rotation.next_song_for_playback().is_none());

    rotation.set_current_singer(Some(bob)).unwrap();
    let next = rotation.next_song_for_playback().unwrap();
    assert_eq!(next.song_id, SongId(2));

    assert_eq!(
        rotation.next_song_path(bob).unwrap().unwrap(),
        "/media/karaoke/SC1002-11.zip"
    );
    // File épuisée : pas de chemin
    let queued = rotation.queue(bob).unwrap()[0].id;
    rotation.set_played(bob, queued, true).unwrap();
    assert!(rotation.next_song_path(bob).unwrap().is_none());
}

#[test]
fn test_set_key_change() {
    let (mut rotation, alice) = session_with_singer();
    let song = rotation.add_song(alice, SongId(1), None).unwrap();

    rotation.set_key_change(alice, song, -3).unwrap();
    assert_eq!(rotation.queue(alice).unwrap()[0].key_change, -3);

    assert!(matches!(
        rotation.set_key_change(alice, QueueSongId(9999), 1),
        Err(Error::UnknownQueueSong(_))
    ));
}

#[test]
fn test_clear_queue() {
    let (mut rotation, alice) = session_with_singer();
    for song in [1, 2, 3] {
        rotation.add_song(alice, SongId(song), None).unwrap();
    }

    rotation.clear_queue(alice).unwrap();
    assert!(rotation.queue(alice).unwrap().is_empty());
    assert!(rotation.next_unplayed(alice).unwrap().is_none());
}

#[test]
fn test_queues_are_scoped_per_singer() {
    let mut rotation = open_session();
    let alice = rotation.add_singer("Alice", AddPolicy::Bottom).unwrap();
    let bob = rotation.add_singer("Bob", AddPolicy::Bottom).unwrap();

    rotation.add_song(alice, SongId(1), None).unwrap();
    rotation.add_song(bob, SongId(2), None).unwrap();
    rotation.add_song(bob, SongId(3), None).unwrap();

    rotation.move_song(bob, 1, 0).unwrap();

    // Les positions de chaque file restent denses et indépendantes
    assert_eq!(song_ids(&rotation, alice), vec![1]);
    assert_eq!(queue_positions(&rotation, alice), vec![0]);
    assert_eq!(song_ids(&rotation, bob), vec![3, 2]);
    assert_eq!(queue_positions(&rotation, bob), vec![0, 1]);
}
