use clap::{Args, Parser, Subcommand};

/// Command-line client for the marketplace.
#[derive(Debug, Parser)]
#[command(name = "marketplace", version)]
pub struct Cli {
    /// Override the configured backend URL.
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every published article.
    Articles,
    /// List the signed-in vendor's articles.
    MyArticles,
    /// Sign in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Publish a new article (vendors).
    CreateArticle(CreateArticleArgs),
    /// Delete one of your articles (vendors).
    DeleteArticle {
        id: u64,
    },
    /// Inspect or change the cart.
    #[command(subcommand)]
    Cart(CartCommand),
    /// Place one order per cart line.
    Checkout(DeliveryArgs),
    /// List orders received by the signed-in vendor.
    VendorOrders,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub name: String,
    /// Register as a vendor instead of a customer.
    #[arg(long)]
    pub vendor: bool,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Debug, Args)]
pub struct CreateArticleArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long)]
    pub stock: u32,
    #[arg(long)]
    pub price: f64,
}

#[derive(Debug, Args)]
pub struct DeliveryArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub phone: String,
}

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Show cart lines and totals.
    Show,
    /// Add an article, capped at its current stock.
    Add {
        id: u64,
        #[arg(long, short, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove an article.
    Remove { id: u64 },
    /// Set the quantity of a line (clamped to 1..=stock).
    Set {
        id: u64,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart.
    Clear,
}
