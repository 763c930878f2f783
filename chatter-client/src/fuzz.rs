#![cfg(test)]

use crate::{api::Post, BulkLoad, ChannelSession, ListSurface};

const MAX_POSTS: usize = 48;

fn session() -> ChannelSession<ListSurface> {
    ChannelSession::new(String::from("ws"), String::from("fuzz"), ListSurface::new())
}

fn rendered(s: &ChannelSession<ListSurface>) -> Vec<(String, usize)> {
    s.surface()
        .views()
        .iter()
        .map(|v| (v.path.clone(), v.depth))
        .collect()
}

/// Builds a tree where every reply points to an earlier post, timestamps all distinct
fn build_tree(spec: &[(u8, u8, u16)]) -> Vec<Post> {
    spec.iter()
        .enumerate()
        .map(|(i, (parent, ts, _))| {
            let parent = match i == 0 || parent % 3 == 0 {
                true => None,
                false => Some(format!("p{}", *parent as usize % i)),
            };
            Post::stub(
                &format!("p{i}"),
                parent.as_deref(),
                *ts as i64 * 1000 + i as i64,
            )
        })
        .collect()
}

#[test]
fn top_level_is_stable_sorted() {
    bolero::check!()
        .with_type::<Vec<u8>>()
        .cloned()
        .for_each(|mut times| {
            times.truncate(MAX_POSTS);
            let posts = times
                .iter()
                .enumerate()
                .map(|(i, t)| Post::stub(&format!("p{i}"), None, *t as i64))
                .collect::<Vec<_>>();
            let mut s = session();
            for p in posts.iter() {
                s.render_message(p.clone());
            }
            let mut expected = posts.clone();
            expected.sort_by_key(|p| p.created_at());
            let expected = expected.iter().map(|p| p.path.as_str()).collect::<Vec<_>>();
            let top_level = s
                .store()
                .top_level()
                .iter()
                .map(|r| r.path.as_str())
                .collect::<Vec<_>>();
            assert_eq!(top_level, expected);
            assert_eq!(s.surface().paths(), expected);
        })
}

#[test]
fn live_delivery_matches_bulk_load() {
    bolero::check!()
        .with_type::<Vec<(u8, u8, u16)>>()
        .cloned()
        .for_each(|mut spec| {
            spec.truncate(MAX_POSTS);
            let posts = build_tree(&spec);

            let bulk = BulkLoad::new(posts.clone());
            assert!(bulk.orphans.is_empty());

            // Deliver in an arbitrary order, children possibly before their parents
            let mut delivery = (0..posts.len()).collect::<Vec<_>>();
            delivery.sort_by_key(|i| spec[*i].2);
            let mut s = session();
            for i in delivery {
                s.render_message(posts[i].clone());
            }

            assert!(s.retry_queue().is_empty());
            assert_eq!(s.store().len(), posts.len());
            assert_eq!(rendered(&s), bulk.order);
            let render_order = s
                .store()
                .render_order()
                .into_iter()
                .map(|(p, d)| (String::from(p), d))
                .collect::<Vec<_>>();
            assert_eq!(render_order, bulk.order);
        })
}

#[test]
fn redelivery_is_idempotent() {
    bolero::check!()
        .with_type::<Vec<(u8, u8, u16)>>()
        .cloned()
        .for_each(|mut spec| {
            spec.truncate(MAX_POSTS);
            let posts = build_tree(&spec);
            let mut s = session();
            for p in posts.iter() {
                s.render_message(p.clone());
            }
            let before = rendered(&s);
            for p in posts.iter().rev() {
                s.render_message(p.clone());
            }
            assert_eq!(rendered(&s), before);
            assert_eq!(s.store().len(), posts.len());
        })
}
