use anyhow::{anyhow, bail, Context, Result};
use marketplace_core::{
    models::{
        Article, CreateArticleRequest, CreateOrderRequest, LoginCredentials, Order,
        RegisterRequest, UserType,
    },
    ApiClient, CartStore, SessionStore,
};
use tracing::{info, warn};

use crate::commands::{CartCommand, Command, CreateArticleArgs, DeliveryArgs, RegisterArgs};

/// Front-end state: one API client plus the two stores, created once per run.
pub struct MarketplaceApp {
    api: ApiClient,
    session: SessionStore,
    cart: CartStore,
}

impl MarketplaceApp {
    pub fn new(api: ApiClient, session: SessionStore, cart: CartStore) -> Self {
        Self { api, session, cart }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Articles => {
                let articles = self.api.list_articles().await?;
                print_articles(&articles);
            }
            Command::MyArticles => {
                let token = self.token()?;
                let articles = self.api.my_articles(&token).await?;
                print_articles(&articles);
            }
            Command::Login { email, password } => {
                let auth = self
                    .api
                    .login(&LoginCredentials { email, password })
                    .await?;
                println!("Signed in as {} ({})", auth.user.name, auth.user.user_type.label());
                self.session.set_auth(auth.user, auth.token);
            }
            Command::Register(args) => self.register(args).await?,
            Command::Logout => {
                self.session.clear_auth();
                println!("Signed out");
            }
            Command::Whoami => match self.session.user() {
                Some(user) => println!(
                    "{} <{}> ({}, id {})",
                    user.name,
                    user.email,
                    user.user_type.label(),
                    user.id
                ),
                None => println!("Not signed in"),
            },
            Command::CreateArticle(args) => self.create_article(args).await?,
            Command::DeleteArticle { id } => {
                let token = self.token()?;
                let message = self.api.delete_article(id, &token).await?;
                println!("{message}");
            }
            Command::Cart(command) => self.cart_command(command).await?,
            Command::Checkout(delivery) => {
                let orders = self.checkout(delivery).await?;
                for order in &orders {
                    print_order(order);
                }
            }
            Command::VendorOrders => {
                let token = self.token()?;
                let orders = self.api.vendor_orders(&token).await?;
                if orders.is_empty() {
                    println!("No orders yet");
                }
                for order in &orders {
                    print_order(order);
                }
            }
        }
        Ok(())
    }

    async fn register(&mut self, args: RegisterArgs) -> Result<()> {
        let registration = RegisterRequest {
            email: args.email,
            password: args.password,
            user_type: if args.vendor {
                UserType::Vendor
            } else {
                UserType::Customer
            },
            name: args.name,
            address: args.address,
            phone: args.phone,
        };
        let auth = self.api.register(&registration).await?;
        println!("Registered {} ({})", auth.user.email, auth.user.user_type.label());
        self.session.set_auth(auth.user, auth.token);
        Ok(())
    }

    async fn create_article(&mut self, args: CreateArticleArgs) -> Result<()> {
        if !self.session.is_vendor() {
            bail!("only vendors can publish articles");
        }
        let token = self.token()?;
        let request = CreateArticleRequest {
            name: args.name,
            description: args.description,
            stock: args.stock,
            price: args.price,
        };
        let article = self.api.create_article(&request, &token).await?;
        println!("Published article {} ({})", article.id, article.name);
        Ok(())
    }

    async fn cart_command(&mut self, command: CartCommand) -> Result<()> {
        match command {
            CartCommand::Show => self.print_cart(),
            CartCommand::Add { id, quantity } => {
                let article = self.fetch_article(id).await?;
                let added = self.cart.add_item(&article, quantity);
                if !article.is_available() {
                    bail!("'{}' is sold out", article.name);
                }
                if added == 0 {
                    bail!("nothing added for '{}'", article.name);
                }
                println!("{} x {} in cart", added, article.name);
            }
            CartCommand::Remove { id } => {
                self.cart.remove_item(id);
                self.print_cart();
            }
            CartCommand::Set { id, quantity } => match self.cart.update_quantity(id, quantity) {
                Some(updated) => println!("Quantity set to {updated}"),
                None => println!("Article {id} is not in the cart"),
            },
            CartCommand::Clear => {
                self.cart.clear();
                println!("Cart emptied");
            }
        }
        Ok(())
    }

    /// Places one order per cart line. Lines are removed from the cart as
    /// their orders succeed; the first failure stops the run.
    async fn checkout(&mut self, delivery: DeliveryArgs) -> Result<Vec<Order>> {
        let token = self.token()?;
        if self.cart.is_empty() {
            bail!("the cart is empty");
        }

        let lines: Vec<(u64, u32)> = self
            .cart
            .items()
            .iter()
            .map(|item| (item.article.id, item.quantity))
            .collect();
        let mut placed = Vec::with_capacity(lines.len());
        for (article_id, quantity) in lines {
            let request = CreateOrderRequest {
                article_id,
                quantity,
                delivery_name: delivery.name.clone(),
                delivery_address: delivery.address.clone(),
                delivery_phone: delivery.phone.clone(),
            };
            let order = self
                .api
                .create_order(&request, &token)
                .await
                .with_context(|| format!("order for article {article_id} failed"))?;
            info!(order_id = order.id, article_id, "order placed");
            self.cart.remove_item(article_id);
            placed.push(order);
        }
        Ok(placed)
    }

    async fn fetch_article(&self, id: u64) -> Result<Article> {
        self.api
            .list_articles()
            .await?
            .into_iter()
            .find(|article| article.id == id)
            .ok_or_else(|| anyhow!("article {id} not found"))
    }

    fn token(&self) -> Result<String> {
        match self.session.token() {
            Some(token) => Ok(token.to_string()),
            None => {
                warn!("protected command without a session");
                bail!("not signed in; run `marketplace login` first")
            }
        }
    }

    fn print_cart(&self) {
        if self.cart.is_empty() {
            println!("Cart is empty");
            return;
        }
        for item in self.cart.items() {
            println!(
                "{:>5}  {:<30} {:>3} x {:>9.2} = {:>10.2}",
                item.article.id,
                item.article.name,
                item.quantity,
                item.article.price,
                item.subtotal()
            );
        }
        println!(
            "{} items, total {:.2}",
            self.cart.total_items(),
            self.cart.total()
        );
    }
}

fn print_articles(articles: &[Article]) {
    if articles.is_empty() {
        println!("No articles");
        return;
    }
    for article in articles {
        let vendor = article
            .vendor
            .as_ref()
            .map(|vendor| vendor.name.as_str())
            .unwrap_or("-");
        let stock = if article.is_available() {
            format!("stock {:>4}", article.stock)
        } else {
            "sold out  ".to_string()
        };
        println!(
            "{:>5}  {:<30} {:>9.2}  {}  {}",
            article.id, article.name, article.price, stock, vendor
        );
    }
}

fn print_order(order: &Order) {
    println!(
        "order {:>5}  article {:>5} x {:<3} total {:>10.2}  {}  -> {}, {}",
        order.id,
        order.article_id,
        order.quantity,
        order.total,
        order.status.label(),
        order.delivery_name,
        order.delivery_address
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use marketplace_core::{storage::MemoryStorage, Storage};
    use serde_json::{json, Value};
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn article_json(id: u64, stock: u32) -> Value {
        json!({
            "id": id,
            "nombre": format!("Article {id}"),
            "descripcion": "",
            "stock": stock,
            "precio": "2.50",
            "vendedorId": 9,
            "createdAt": "2024-05-01T12:00:00Z",
            "updatedAt": "2024-05-01T12:00:00Z"
        })
    }

    fn order_json(id: u64, article_id: u64) -> Value {
        json!({
            "id": id,
            "clienteId": 1,
            "articuloId": article_id,
            "cantidad": 1,
            "nombreEntrega": "Ana",
            "direccionEntrega": "Calle Mayor 1",
            "telefonoEntrega": "600",
            "total": 2.5,
            "estado": "pendiente",
            "createdAt": "2024-05-01T12:00:00Z",
            "updatedAt": "2024-05-01T12:00:00Z"
        })
    }

    fn user_json() -> Value {
        json!({
            "id": 1,
            "email": "ana@example.com",
            "tipo": "cliente",
            "nombre": "Ana",
            "createdAt": "2024-05-01T12:00:00Z",
            "updatedAt": "2024-05-01T12:00:00Z"
        })
    }

    fn delivery() -> DeliveryArgs {
        DeliveryArgs {
            name: "Ana".to_string(),
            address: "Calle Mayor 1".to_string(),
            phone: "600".to_string(),
        }
    }

    async fn signed_in_app(server: &MockServer, storage: Arc<MemoryStorage>) -> MarketplaceApp {
        let mut session = SessionStore::restore(storage.clone());
        session.set_auth(serde_json::from_value(user_json()).unwrap(), "jwt");
        let cart = CartStore::load(storage);
        MarketplaceApp::new(ApiClient::new(server.uri()), session, cart)
    }

    async fn mount_articles(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/articles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "ok",
                "data": { "articles": [article_json(1, 5), article_json(2, 3), article_json(3, 0)] }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn cart_add_uses_current_stock() {
        let server = MockServer::start().await;
        mount_articles(&server).await;
        let storage = Arc::new(MemoryStorage::new());
        let mut app = signed_in_app(&server, storage.clone()).await;

        app.run(Command::Cart(CartCommand::Add { id: 2, quantity: 9 }))
            .await
            .unwrap();
        assert_eq!(app.cart.item_quantity(2), 3);
        assert_eq!(CartStore::load(storage).item_quantity(2), 3);

        let missing = app
            .run(Command::Cart(CartCommand::Add { id: 77, quantity: 1 }))
            .await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn cart_add_rejects_sold_out_article() {
        let server = MockServer::start().await;
        mount_articles(&server).await;
        let storage = Arc::new(MemoryStorage::new());
        let mut app = signed_in_app(&server, storage).await;

        let err = app
            .run(Command::Cart(CartCommand::Add { id: 3, quantity: 1 }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "'Article 3' is sold out");
        assert!(!app.cart.is_in_cart(3));
    }

    #[tokio::test]
    async fn checkout_keeps_failed_lines_in_cart() {
        let server = MockServer::start().await;
        mount_articles(&server).await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(body_partial_json(json!({ "articuloId": 1 })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "message": "Orden creada",
                "data": { "order": order_json(10, 1) }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(body_partial_json(json!({ "articuloId": 2 })))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "Stock insuficiente"
            })))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let mut app = signed_in_app(&server, storage).await;
        app.run(Command::Cart(CartCommand::Add { id: 1, quantity: 1 }))
            .await
            .unwrap();
        app.run(Command::Cart(CartCommand::Add { id: 2, quantity: 1 }))
            .await
            .unwrap();

        let err = app.checkout(delivery()).await.unwrap_err();
        assert_eq!(err.root_cause().to_string(), "Stock insuficiente");
        assert!(!app.cart.is_in_cart(1));
        assert!(app.cart.is_in_cart(2));
    }

    #[tokio::test]
    async fn protected_commands_require_a_session() {
        let server = MockServer::start().await;
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut app = MarketplaceApp::new(
            ApiClient::new(server.uri()),
            SessionStore::restore(storage.clone()),
            CartStore::load(storage),
        );

        assert!(app.run(Command::VendorOrders).await.is_err());
        assert!(app.checkout(delivery()).await.is_err());
    }

    #[tokio::test]
    async fn login_stores_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "ok",
                "data": { "user": user_json(), "token": "fresh" }
            })))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let mut app = MarketplaceApp::new(
            ApiClient::new(server.uri()),
            SessionStore::restore(storage.clone()),
            CartStore::load(storage.clone()),
        );
        app.run(Command::Login {
            email: "ana@example.com".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(SessionStore::restore(storage).token(), Some("fresh"));
    }
}
