use std::io::Write;

use crate::{
    Res, graph, info,
    spotify::{SpotifyApi, playlists},
    success, utils, warning,
};

/// Lists the playlists when no name is given, renders the graph otherwise.
pub async fn run<A: SpotifyApi, W: Write>(api: &A, playlist: Option<&str>, out: &mut W) -> Res<()> {
    match playlist {
        Some(name) => graph_playlist(api, name, out).await,
        None => list_playlists(api, out).await,
    }
}

/// Writes the name of every playlist of the current user, one per line.
pub async fn list_playlists<A: SpotifyApi, W: Write>(api: &A, out: &mut W) -> Res<()> {
    warning!("No playlist name given. Your playlists:");

    for playlist in playlists::get_all_playlists(api).await? {
        writeln!(out, "{}", playlist.name)?;
    }
    Ok(())
}

/// Writes the artist collaboration graph of the playlist called `name`.
pub async fn graph_playlist<A: SpotifyApi, W: Write>(api: &A, name: &str, out: &mut W) -> Res<()> {
    let playlist = playlists::find_playlist(api, name).await?;
    match &playlist.tracks {
        Some(tracks) => info!("Using playlist: {} ({} tracks)", playlist.name, tracks.total),
        None => info!("Using playlist: {}", playlist.name),
    }

    let pb = utils::spinner("Fetching playlist tracks...");
    let items = playlists::get_all_playlist_tracks(api, &playlist.id).await;
    pb.finish_and_clear();
    let items = items?;

    let edges = graph::collect_edges(&items);
    success!("Fetched {} tracks, {} collaborations", items.len(), edges.len());

    out.write_all(graph::render_dot(&edges).as_bytes())?;
    out.flush()?;
    Ok(())
}
