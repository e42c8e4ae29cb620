//! Déroulé d'une petite soirée karaoké, de bout en bout
//!
//! Usage:
//!   cargo run --example session_night

use anyhow::Result;
use kjdb::{NewSong, SongCatalog, SqliteCatalog, SqliteStore};
use kjrotation::{AddPolicy, Rotation, RotationOptions, SongId, SystemClock};
use std::sync::Arc;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Catalogue et session en mémoire pour la démonstration
    let catalog = Arc::new(SqliteCatalog::open_in_memory()?);
    let mut song_ids = Vec::new();
    for (artist, title, disc_id, duration_secs) in [
        ("Queen", "Bohemian Rhapsody", "SC8125-04", Some(355)),
        ("ABBA", "Waterloo", "SC1002-11", Some(170)),
        ("Toto", "Africa", "SC2201-07", Some(296)),
    ] {
        let path = format!("/media/karaoke/{}.zip", disc_id);
        song_ids.push(SongId(catalog.insert_song(&NewSong {
            artist,
            title,
            disc_id,
            path: &path,
            duration_secs,
        })?));
    }

    let store = Arc::new(SqliteStore::open_in_memory()?);
    let mut rotation = Rotation::open(
        store,
        catalog.clone(),
        Arc::new(SystemClock),
        RotationOptions::default(),
    )?;

    rotation.subscribe(|event| println!("  [event] {:?}", event));

    // La soirée démarre : trois chanteurs, Carol arrive en pli équitable
    let alice = rotation.add_singer("Alice", AddPolicy::Bottom)?;
    let bob = rotation.add_singer("Bob", AddPolicy::Bottom)?;
    rotation.set_current_singer(Some(alice))?;
    let carol = rotation.add_singer("Carol", AddPolicy::Fair)?;

    rotation.add_song(alice, song_ids[0], None)?;
    rotation.add_song(bob, song_ids[1], None)?;
    rotation.add_song(carol, song_ids[2], None)?;

    println!("\nRotation :");
    for singer in rotation.singers() {
        let wait = rotation.wait_seconds(singer.id, 120)?;
        println!(
            "  {}. {:8} attente ~{} s",
            singer.position, singer.name, wait
        );
    }

    // Alice chante, on marque sa chanson jouée
    if let Some(next) = rotation.next_song_for_playback() {
        let info = catalog.song(next.song_id.0)?.expect("catalog song");
        println!("\nAu micro : {} - {}", info.artist, info.title);
        let queued = next.id;
        rotation.set_played(alice, queued, true)?;
    }

    // Bob devient un régulier : son historique survivra à la session
    rotation.make_regular(bob)?;
    let doc = rotation.export_regulars()?;
    println!("\nExport des réguliers :\n{}", doc.to_json()?);

    Ok(())
}
