//! Artist collaboration graph.
//!
//! Every track contributes one edge from its first listed artist to each of
//! the other listed artists, labelled with the track title. Repeated pairs are
//! kept as separate edges.

use std::fmt::Write;

use crate::{
    types::{PlaylistItem, TrackArtistEdge},
    utils,
};

/// Extracts the collaboration edges of `items`, in playlist order.
///
/// Entries without a track (removed or unavailable items) and tracks with no
/// artists contribute nothing.
pub fn collect_edges(items: &[PlaylistItem]) -> Vec<TrackArtistEdge> {
    items
        .iter()
        .filter_map(|item| item.track.as_ref())
        .flat_map(|track| {
            let mut artists = track.artists.iter();
            let primary = artists.next();
            artists.filter_map(move |other| {
                primary.map(|artist| TrackArtistEdge {
                    artist: artist.name.clone(),
                    collaborator: other.name.clone(),
                    title: track.name.clone(),
                })
            })
        })
        .collect()
}

/// Renders `edges` as a Graphviz `digraph`.
///
/// ```text
/// digraph {
///   "A" -> "B" [label="Foo Bar"];
/// }
/// ```
pub fn render_dot(edges: &[TrackArtistEdge]) -> String {
    let mut out = String::from("digraph {\n");
    for edge in edges {
        // writing into a String cannot fail
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [label=\"{}\"];",
            utils::escape_dot_id(&edge.artist),
            utils::escape_dot_id(&edge.collaborator),
            utils::dot_label(&edge.title),
        );
    }
    out.push_str("}\n");
    out
}
