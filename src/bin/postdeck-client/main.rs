use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;

use postdeck::client::notice::notice_channel;
use postdeck::client::{DraftField, FormMode, HttpPostApi, Notice, NoticeLevel, PostApi, PostForm, SubmitOutcome};
use postdeck::config::DEFAULT_USER_HEADER;
use postdeck::post::PostResponse;
use postdeck::text_utils::join_tags;

#[derive(Parser, Debug)]
#[command(version, about = "Creates and edits posts on a postdeck server", long_about = None)]
struct Cli {
    /// Base URL of the post API
    #[arg(long, default_value = "http://127.0.0.1:8001")]
    api_url: String,

    /// Id of the signed in user
    #[arg(long, env = "POSTDECK_USER_ID")]
    user_id: Option<String>,

    /// Header carrying the user id
    #[arg(long, default_value = DEFAULT_USER_HEADER)]
    user_header: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct PostFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    short_description: Option<String>,
    #[arg(long)]
    content: Option<String>,
    /// Comma separated tags
    #[arg(long)]
    tags: Option<String>,
    /// Image file used as the main photo
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates a new post
    Create(PostFields),
    /// Loads a post and saves it with the given fields replaced
    Edit {
        #[arg(long)]
        id: String,
        #[command(flatten)]
        fields: PostFields,
    },
    /// Lists posts, newest first
    List {
        /// Only posts written by this user
        #[arg(long)]
        author: Option<String>,
    },
    Get {
        #[arg(long)]
        id: String,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
}

fn print_notices(rx: &mut UnboundedReceiver<Notice>) {
    while let Ok(notice) = rx.try_recv() {
        match notice.level {
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
            NoticeLevel::Success => println!("ok: {}", notice.message),
            NoticeLevel::Info => println!("{}", notice.message),
        }
    }
}

fn print_post(post: &PostResponse) {
    println!("{}  {}", post.id, post.title);
    println!("    {}", post.short_description);
    println!("    tags: {}", join_tags(&post.tags));
    println!("    photo: {}", post.main_photo);
    println!("    author: {}  updated: {}", post.user_id.id(), post.updated_at.format("%Y-%m-%d %H:%M"));
}

async fn fill_form(form: &mut PostForm<HttpPostApi>, fields: PostFields) {
    let values = [
        (DraftField::Title, fields.title),
        (DraftField::ShortDescription, fields.short_description),
        (DraftField::Content, fields.content),
        (DraftField::Tags, fields.tags),
    ];
    for (field, value) in values {
        if let Some(value) = value {
            form.change(field, &value);
        }
    }

    if let Some(image) = fields.image {
        form.select_image(&image).await;
    }
}

async fn run_form(api: HttpPostApi, mode: FormMode, fields: PostFields) -> Result<()> {
    let (notifier, mut rx) = notice_channel();
    let mut form = PostForm::new(api, mode, notifier);

    if let FormMode::Edit { post_id } = form.mode().clone() {
        if !form.load().await {
            print_notices(&mut rx);
            bail!("Post {} could not be loaded", post_id);
        }
    }

    fill_form(&mut form, fields).await;
    let outcome = form.submit().await;
    print_notices(&mut rx);

    match outcome {
        SubmitOutcome::Created(post) | SubmitOutcome::Updated(post) => {
            print_post(&post);
            Ok(())
        }
        SubmitOutcome::Incomplete | SubmitOutcome::Failed => bail!("Post was not saved"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = HttpPostApi::new(&cli.api_url, &cli.user_header, cli.user_id);

    match cli.command {
        Command::Create(fields) => run_form(api, FormMode::Create, fields).await,
        Command::Edit { id, fields } => run_form(api, FormMode::Edit { post_id: id }, fields).await,
        Command::List { author } => {
            let posts = api.list(author.as_deref()).await?;
            for post in &posts {
                print_post(post);
            }
            println!("{} posts", posts.len());
            Ok(())
        }
        Command::Get { id } => {
            match api.get(&id).await? {
                Some(post) => print_post(&post),
                None => println!("Post {} not found", id),
            }
            Ok(())
        }
        Command::Delete { id } => {
            println!("{}", api.delete(&id).await?);
            Ok(())
        }
    }
}
