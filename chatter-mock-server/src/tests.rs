use std::sync::Arc;

use chatter_client::{
    api::{NewPost, PatchOp, ReactionKind},
    Arrival, Client, ListSurface,
};
use tokio::sync::Mutex;

use super::*;

const WS: &str = "acme";

fn setup() -> (Arc<Mutex<MockServer>>, AuthToken) {
    let mut server = MockServer::new();
    server
        .admin_create_user(String::from("alice"), String::from("pass"))
        .unwrap();
    let tok = server
        .auth(NewSession {
            username: String::from("alice"),
            password: String::from("pass"),
        })
        .unwrap();
    server.create_channel(&tok, WS, "general").unwrap();
    server.create_channel(&tok, WS, "random").unwrap();
    (Arc::new(Mutex::new(server)), tok)
}

fn new_post(msg: &str, parent: Option<&str>) -> NewPost {
    NewPost {
        msg: String::from(msg),
        parent: parent.map(String::from),
    }
}

fn rendered(client: &Client<MockTransport, ListSurface>) -> Vec<(String, usize)> {
    client
        .session()
        .unwrap()
        .surface()
        .views()
        .iter()
        .map(|v| (v.text.clone(), v.depth))
        .collect()
}

#[test]
fn auth_checks_password() {
    let mut server = MockServer::new();
    server
        .admin_create_user(String::from("bob"), String::from("pw"))
        .unwrap();
    assert_eq!(
        server.admin_create_user(String::from("bob"), String::from("other")),
        Err(Error::NameAlreadyUsed(String::from("bob")))
    );
    let bad = NewSession {
        username: String::from("bob"),
        password: String::from("nope"),
    };
    assert_eq!(server.auth(bad), Err(Error::PermissionDenied));
    let tok = server
        .auth(NewSession {
            username: String::from("bob"),
            password: String::from("pw"),
        })
        .unwrap();
    assert_eq!(server.whoami(&tok), Ok("bob"));
    server.unauth(&tok).unwrap();
    assert_eq!(server.whoami(&tok), Err(Error::PermissionDenied));
}

#[test]
fn failed_patch_changes_nothing() {
    let (server, tok) = setup();
    let mut server = server.try_lock().unwrap();
    let uri = server
        .create_post(&tok, WS, "general", new_post("hi", None))
        .unwrap();
    let res = server
        .patch_post(&tok, &uri.uri, PatchOp::reaction(":like:", "alice", true))
        .unwrap();
    assert!(res.patch_failed);
    let posts = server.fetch_posts(&tok, WS, "general").unwrap();
    assert_eq!(posts[0].doc.reactions, None);

    let res = server
        .patch_post(&tok, &uri.uri, PatchOp::reaction(":like:", "alice", false))
        .unwrap();
    assert!(!res.patch_failed);
    let posts = server.fetch_posts(&tok, WS, "general").unwrap();
    assert!(posts[0].has_reacted(":like:", "alice"));
}

#[tokio::test]
async fn open_channel_displays_threads() {
    let (server, tok) = setup();
    {
        let mut s = server.lock().await;
        let a = s.create_post(&tok, WS, "general", new_post("a", None)).unwrap();
        s.create_post(&tok, WS, "general", new_post("b", None)).unwrap();
        s.create_post(&tok, WS, "general", new_post("a1", Some(a.uri.as_str())))
            .unwrap();
    }
    let mut client = Client::<_, ListSurface>::new(MockTransport::new(server, tok));
    client.open_channel(WS, "general").await.unwrap();
    assert_eq!(
        rendered(&client),
        vec![
            (String::from("a"), 0),
            (String::from("a1"), 1),
            (String::from("b"), 0)
        ]
    );

    // The feed starts by replaying what was already fetched
    for _ in 0..3 {
        assert_eq!(client.next_arrival().await, Some(Arrival::Updated));
    }
    assert_eq!(rendered(&client).len(), 3);
}

#[tokio::test]
async fn replies_arrive_live() {
    let (server, tok) = setup();
    let mut client =
        Client::<_, ListSurface>::new(MockTransport::new(server.clone(), tok.clone()));
    client.open_channel(WS, "general").await.unwrap();

    let top = client.post_message(String::from("top"), None).await.unwrap();
    client
        .post_message(String::from("reply"), Some(top.uri.clone()))
        .await
        .unwrap();
    assert_eq!(client.next_arrival().await, Some(Arrival::Inserted));
    assert_eq!(client.next_arrival().await, Some(Arrival::Inserted));
    assert_eq!(
        rendered(&client),
        vec![(String::from("top"), 0), (String::from("reply"), 1)]
    );
    assert_eq!(
        client.session().unwrap().post(&top.uri).unwrap().created_by(),
        "alice"
    );
}

#[tokio::test]
async fn early_reply_waits_for_parent() {
    let (server, tok) = setup();
    let mut client =
        Client::<_, ListSurface>::new(MockTransport::new(server.clone(), tok.clone()));
    client.open_channel(WS, "general").await.unwrap();
    let parent = Post::stub("/acme/channels/general/posts/p", None, 10);
    let reply = Post::stub("/acme/channels/general/posts/r", Some(parent.path.as_str()), 20);
    {
        let mut s = server.lock().await;
        s.test_inject_raw(WS, "general", &serde_json::to_string(&reply).unwrap());
        s.test_inject_raw(WS, "general", &serde_json::to_string(&parent).unwrap());
    }
    assert_eq!(client.next_arrival().await, Some(Arrival::Queued));
    assert!(rendered(&client).is_empty());
    assert_eq!(client.next_arrival().await, Some(Arrival::Inserted));
    assert_eq!(
        rendered(&client),
        vec![
            (String::from("message /acme/channels/general/posts/p"), 0),
            (String::from("message /acme/channels/general/posts/r"), 1)
        ]
    );
    assert!(client.session().unwrap().retry_queue().is_empty());
}

#[tokio::test]
async fn switching_channel_drops_old_feed() {
    let (server, tok) = setup();
    let mut client =
        Client::<_, ListSurface>::new(MockTransport::new(server.clone(), tok.clone()));
    client.open_channel(WS, "general").await.unwrap();
    assert_eq!(server.lock().await.test_num_feeds(WS, "general"), 1);

    client.open_channel(WS, "random").await.unwrap();
    {
        let mut s = server.lock().await;
        s.create_post(&tok, WS, "general", new_post("elsewhere", None))
            .unwrap();
        assert_eq!(s.test_num_feeds(WS, "general"), 0);
        s.create_post(&tok, WS, "random", new_post("here", None))
            .unwrap();
    }
    assert_eq!(client.next_arrival().await, Some(Arrival::Inserted));
    assert_eq!(rendered(&client), vec![(String::from("here"), 0)]);
    assert_eq!(client.session().unwrap().channel(), "random");

    client.close_channel();
    assert!(client.session().is_none());
    assert_eq!(client.next_arrival().await, None);
}

#[tokio::test]
async fn malformed_payloads_are_dropped() {
    let (server, tok) = setup();
    let mut client =
        Client::<_, ListSurface>::new(MockTransport::new(server.clone(), tok.clone()));
    client.open_channel(WS, "general").await.unwrap();
    {
        let mut s = server.lock().await;
        s.test_inject_raw(WS, "general", "{\"path\": 42");
        s.test_inject_raw(WS, "general", "");
        s.create_post(&tok, WS, "general", new_post("fine", None))
            .unwrap();
    }
    assert_eq!(client.next_arrival().await, Some(Arrival::Inserted));
    assert_eq!(rendered(&client), vec![(String::from("fine"), 0)]);
}

#[tokio::test]
async fn reactions_toggle() {
    let (server, tok) = setup();
    let uri = server
        .lock()
        .await
        .create_post(&tok, WS, "general", new_post("react to me", None))
        .unwrap();
    let mut client =
        Client::<_, ListSurface>::new(MockTransport::new(server.clone(), tok.clone()));
    client.open_channel(WS, "general").await.unwrap();
    assert_eq!(client.next_arrival().await, Some(Arrival::Updated));

    let set = client
        .toggle_reaction(&uri.uri, ReactionKind::Like, "alice")
        .await
        .unwrap();
    assert!(set);
    assert_eq!(client.next_arrival().await, Some(Arrival::Updated));
    let view = &client.session().unwrap().surface().views()[0];
    assert!(view.reactions.contains(&(ReactionKind::Like, 1)));

    let set = client
        .toggle_reaction(&uri.uri, ReactionKind::Like, "alice")
        .await
        .unwrap();
    assert!(!set);
    assert_eq!(client.next_arrival().await, Some(Arrival::Updated));
    let view = &client.session().unwrap().surface().views()[0];
    assert!(view.reactions.contains(&(ReactionKind::Like, 0)));
}

#[tokio::test]
async fn reacting_to_unknown_post_fails() {
    let (server, tok) = setup();
    let mut client = Client::<_, ListSurface>::new(MockTransport::new(server, tok));
    assert!(client
        .toggle_reaction("/nope", ReactionKind::Smile, "alice")
        .await
        .is_err());
    client.open_channel(WS, "general").await.unwrap();
    let err = client
        .toggle_reaction("/nope", ReactionKind::Smile, "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<Error>(),
        Some(&Error::NotFound(String::from("/nope")))
    );
}

#[tokio::test]
async fn missing_channel_is_an_error() {
    let (server, tok) = setup();
    let mut client = Client::<_, ListSurface>::new(MockTransport::new(server, tok));
    assert!(client.open_channel(WS, "nope").await.is_err());
    assert!(client.session().is_none());
    assert!(client
        .post_message(String::from("hi"), None)
        .await
        .is_err());
}
