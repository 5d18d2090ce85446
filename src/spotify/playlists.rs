use std::future::Future;

use crate::{
    Error, Res,
    spotify::SpotifyApi,
    types::{Page, Playlist, PlaylistItem},
};

/// Page size for playlist tracks, the endpoint maximum.
pub const TRACKS_PAGE_SIZE: u32 = 100;

/// Page size for the current user's playlists, the endpoint maximum.
pub const PLAYLISTS_PAGE_SIZE: u32 = 50;

/// Collects every item of an offset-paginated endpoint.
///
/// `fetch` is called with `(limit, offset)`, starting at offset 0 and
/// advancing by `page_size`, until the offset reaches the total reported by
/// the last page. Items keep the order the API returned them in. The first
/// failing page aborts the whole collection.
pub async fn collect_pages<T, F, Fut>(page_size: u32, mut fetch: F) -> Res<Vec<T>>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Res<Page<T>>>,
{
    let mut items = Vec::new();
    let mut offset = 0;

    loop {
        let page = fetch(page_size, offset).await?;
        items.extend(page.items);
        offset += page_size;

        if offset >= page.total {
            break;
        }
    }

    Ok(items)
}

/// Returns every entry of a playlist in playlist order.
pub async fn get_all_playlist_tracks<A: SpotifyApi>(
    api: &A,
    playlist_id: &str,
) -> Res<Vec<PlaylistItem>> {
    collect_pages(TRACKS_PAGE_SIZE, move |limit, offset| {
        api.playlist_tracks_page(playlist_id, limit, offset)
    })
    .await
}

/// Returns all playlists of the current user.
pub async fn get_all_playlists<A: SpotifyApi>(api: &A) -> Res<Vec<Playlist>> {
    collect_pages(PLAYLISTS_PAGE_SIZE, move |limit, offset| {
        api.playlists_page(limit, offset)
    })
    .await
}

/// Looks up one of the current user's playlists by exact name.
pub async fn find_playlist<A: SpotifyApi>(api: &A, name: &str) -> Res<Playlist> {
    get_all_playlists(api)
        .await?
        .into_iter()
        .find(|playlist| playlist.name == name)
        .ok_or_else(|| Error::PlaylistNotFound(name.to_string()))
}
