use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header::LOCATION, redirect};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use url::Url;

const REMOTE_USER_HEADER: &str = "x-remote-user";

#[derive(Parser)]
#[command(name = "blogger")]
#[command(about = "A CLI for reading and publishing on a Blogger service")]
struct Cli {
    /// Base URL for the Blogger service
    #[arg(long, default_value = "http://localhost:3000")]
    service_url: String,

    /// Username to act as; forwarded to the service as the remote user
    #[arg(short, long, env = "BLOGGER_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List published articles, optionally filtered by title keywords
    List {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long)]
        page: Option<String>,
    },
    /// Show the most popular articles
    Popular,
    /// Show a published article
    Show { slug: String },
    /// Write a new article
    Create {
        title: String,
        #[arg(short, long)]
        content: String,
        /// Publish immediately instead of saving a draft
        #[arg(long)]
        publish: bool,
    },
    /// Like an article
    Like { slug: String },
    /// Dislike an article
    Dislike { slug: String },
}

#[derive(Serialize)]
struct ArticleForm<'a> {
    title: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    published: Option<&'a str>,
}

#[derive(Deserialize)]
struct ArticleSummary {
    title: String,
    slug: String,
    author: String,
    publish_date: Option<String>,
    likes: Option<i64>,
    dislikes: Option<i64>,
}

#[derive(Deserialize)]
struct ArticleListResponse {
    articles: Vec<ArticleSummary>,
    page: Option<PageInfo>,
}

#[derive(Deserialize)]
struct PageInfo {
    number: i64,
    num_pages: i64,
    total: i64,
}

#[derive(Deserialize)]
struct ArticleDetail {
    title: String,
    content: String,
    publish_date: Option<String>,
}

#[derive(Deserialize)]
struct Author {
    username: String,
}

#[derive(Deserialize)]
struct ArticlePageResponse {
    article: ArticleDetail,
    author: Author,
    likes: i64,
    dislikes: i64,
}

struct Blogger {
    client: Client,
    base: Url,
    user: Option<String>,
}

impl Blogger {
    fn new(service_url: &str, user: Option<String>) -> Result<Self, Box<dyn Error>> {
        // Redirects carry meaning (created vs. login required), so surface them
        let client = Client::builder().redirect(redirect::Policy::none()).build()?;
        Ok(Self {
            client,
            base: Url::parse(service_url)?,
            user,
        })
    }

    fn with_user(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.user {
            Some(user) => request.header(REMOTE_USER_HEADER, user),
            None => request,
        }
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, Box<dyn Error>> {
        Ok(self.with_user(self.client.get(self.base.join(path)?)))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, Box<dyn Error>> {
        Ok(self.with_user(self.client.post(self.base.join(path)?)))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let blogger = Blogger::new(&cli.service_url, cli.user)?;

    match cli.command {
        Commands::List { query, page } => list_articles(&blogger, query, page).await?,
        Commands::Popular => popular_articles(&blogger).await?,
        Commands::Show { slug } => show_article(&blogger, &slug).await?,
        Commands::Create {
            title,
            content,
            publish,
        } => create_article(&blogger, &title, &content, publish).await?,
        Commands::Like { slug } => vote(&blogger, &slug, "like").await?,
        Commands::Dislike { slug } => vote(&blogger, &slug, "dislike").await?,
    }

    Ok(())
}

async fn list_articles(
    blogger: &Blogger,
    query: Option<String>,
    page: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut params = Vec::new();
    if let Some(query) = &query {
        params.push(("query", query.as_str()));
    }
    if let Some(page) = &page {
        params.push(("page", page.as_str()));
    }

    let response = blogger.get("/")?.query(&params).send().await?;
    let Some(response) = expect_ok(response).await? else {
        return Ok(());
    };
    let list: ArticleListResponse = response.json().await?;

    if list.articles.is_empty() {
        println!("No articles available yet.");
    }
    for article in &list.articles {
        print_summary(article);
    }
    if let Some(page) = list.page {
        println!(
            "Page {} of {} ({} articles)",
            page.number, page.num_pages, page.total
        );
    }

    Ok(())
}

async fn popular_articles(blogger: &Blogger) -> Result<(), Box<dyn Error>> {
    let response = blogger.get("/articles/popular/")?.send().await?;
    let Some(response) = expect_ok(response).await? else {
        return Ok(());
    };
    let list: ArticleListResponse = response.json().await?;

    for (position, article) in list.articles.iter().enumerate() {
        print!("{:>2}. ", position + 1);
        print_summary(article);
    }

    Ok(())
}

async fn show_article(blogger: &Blogger, slug: &str) -> Result<(), Box<dyn Error>> {
    let response = blogger.get(&format!("/article/{slug}/"))?.send().await?;
    let Some(response) = expect_ok(response).await? else {
        return Ok(());
    };
    let page: ArticlePageResponse = response.json().await?;

    println!("{}", page.article.title);
    println!(
        "by {} on {}  (+{} / -{})",
        page.author.username,
        page.article.publish_date.as_deref().unwrap_or("-"),
        page.likes,
        page.dislikes
    );
    println!();
    println!("{}", page.article.content);

    Ok(())
}

async fn create_article(
    blogger: &Blogger,
    title: &str,
    content: &str,
    publish: bool,
) -> Result<(), Box<dyn Error>> {
    let form = ArticleForm {
        title,
        content,
        published: publish.then_some("on"),
    };

    let response = blogger.post("/articles/create/")?.form(&form).send().await?;
    match response.status() {
        StatusCode::FOUND if is_login_redirect(&response) => {
            eprintln!("Login required: pass --user");
        }
        StatusCode::FOUND => println!("Article saved"),
        StatusCode::OK => {
            let body: Value = response.json().await?;
            eprintln!("Article rejected: {}", body["errors"]);
        }
        status => {
            eprintln!("Failed to create article: {status}");
            eprintln!("Response: {}", response.text().await?);
        }
    }

    Ok(())
}

async fn vote(blogger: &Blogger, slug: &str, action: &str) -> Result<(), Box<dyn Error>> {
    let response = blogger
        .post(&format!("/article/{slug}/{action}/"))?
        .send()
        .await?;

    match response.status() {
        StatusCode::FOUND if is_login_redirect(&response) => {
            eprintln!("Login required: pass --user");
        }
        StatusCode::FOUND => println!("Recorded {action} for {slug}"),
        StatusCode::OK => println!("You already recorded a {action} for {slug}"),
        StatusCode::NOT_FOUND => eprintln!("No article at {slug}"),
        status => {
            eprintln!("Failed to {action} {slug}: {status}");
            eprintln!("Response: {}", response.text().await?);
        }
    }

    Ok(())
}

fn is_login_redirect(response: &Response) -> bool {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|location| location.starts_with("/accounts/login/"))
}

async fn expect_ok(response: Response) -> Result<Option<Response>, Box<dyn Error>> {
    if response.status().is_success() {
        return Ok(Some(response));
    }

    eprintln!("Request failed: {}", response.status());
    eprintln!("Response: {}", response.text().await?);
    Ok(None)
}

fn print_summary(article: &ArticleSummary) {
    let date = article.publish_date.as_deref().unwrap_or("draft");
    print!("{} [{}] by {} ({date})", article.title, article.slug, article.author);
    if let (Some(likes), Some(dislikes)) = (article.likes, article.dislikes) {
        print!("  +{likes} / -{dislikes}");
    }
    println!();
}
