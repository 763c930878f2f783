use anyhow::{anyhow, Context};
use chatter_client::{
    api::{NewPost, ReactionKind},
    Arrival, ChannelSession, Client, ListSurface, Transport,
};
use tracing_subscriber::EnvFilter;

mod config;
mod http;

use config::ClientConfig;
use http::HttpTransport;

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long, env = "CHATTER_HOST")]
    host: String,

    /// Prefix of post paths on the server
    #[structopt(long, default_value = "/posts")]
    posts_base: String,

    /// User to react as
    #[structopt(short, long, env = "CHATTER_USER")]
    user: Option<String>,

    /// Spaces of indentation per reply level
    #[structopt(long, default_value = "4")]
    indent: usize,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Print a channel
    Show { workspace: String, channel: String },

    /// Print a channel, then keep it up to date until interrupted
    Watch { workspace: String, channel: String },

    /// Post a message
    Post {
        workspace: String,
        channel: String,
        msg: String,

        /// Path of the message to reply to
        #[structopt(short, long)]
        parent: Option<String>,
    },

    /// Toggle a reaction on a message
    React {
        workspace: String,
        channel: String,
        path: String,

        /// One of smile, frown, like, celebrate
        reaction: ReactionKind,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    let config = ClientConfig::new(&opt.host, opt.posts_base, config::env_token()?, opt.indent)?;
    let indent = config.indent;
    let transport = HttpTransport::new(config);

    match opt.cmd {
        Command::Show { workspace, channel } => {
            let posts = transport
                .fetch_posts(&workspace, &channel)
                .await
                .with_context(|| format!("fetching channel {workspace}/{channel}"))?;
            let session = ChannelSession::from_posts(workspace, channel, posts, ListSurface::new());
            if !session.retry_queue().is_empty() {
                tracing::warn!(
                    num_orphans = session.retry_queue().len(),
                    "some replies point to messages that are not in the channel",
                );
            }
            print!("{}", session.surface().render_text(indent));
        }
        Command::Watch { workspace, channel } => {
            let mut client = Client::<_, ListSurface>::new(transport);
            client.open_channel(&workspace, &channel).await?;
            print_channel(&client, indent);
            loop {
                tokio::select! {
                    arrival = client.next_arrival() => match arrival {
                        Some(Arrival::Inserted | Arrival::Updated) => print_channel(&client, indent),
                        Some(Arrival::Queued) => (),
                        None => {
                            tracing::info!("live feed ended");
                            break;
                        }
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            client.close_channel();
        }
        Command::Post {
            workspace,
            channel,
            msg,
            parent,
        } => {
            let post = NewPost { msg, parent };
            post.validate()?;
            let uri = transport
                .create_post(&workspace, &channel, post)
                .await
                .context("posting message")?;
            println!("{}", uri.uri);
        }
        Command::React {
            workspace,
            channel,
            path,
            reaction,
        } => {
            let user = opt
                .user
                .ok_or_else(|| anyhow!("reacting needs --user or CHATTER_USER"))?;
            let mut client = Client::<_, ListSurface>::new(transport);
            client.open_channel(&workspace, &channel).await?;
            let set = client.toggle_reaction(&path, reaction, &user).await?;
            client.close_channel();
            match set {
                true => println!("added {reaction} to {path}"),
                false => println!("removed {reaction} from {path}"),
            }
        }
    }

    Ok(())
}

fn print_channel<T: Transport>(client: &Client<T, ListSurface>, indent: usize) {
    if let Some(session) = client.session() {
        println!("--- {}/{}", session.workspace(), session.channel());
        print!("{}", session.surface().render_text(indent));
    }
}
