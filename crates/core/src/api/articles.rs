use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use super::{ApiClient, ApiError};
use crate::models::{Article, CreateArticleRequest};

#[derive(Debug, Deserialize)]
struct ArticleList {
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct CreatedArticle {
    article: Article,
}

impl ApiClient {
    /// `GET /articles`: every published article.
    pub async fn list_articles(&self) -> Result<Vec<Article>, ApiError> {
        let request = self.request(Method::GET, "/articles", None);
        let envelope = self
            .execute::<ArticleList>(request, "Error al cargar artículos")
            .await?;
        Ok(envelope.into_data()?.articles)
    }

    /// `GET /articles/my-articles`: articles owned by the authenticated vendor.
    pub async fn my_articles(&self, token: &str) -> Result<Vec<Article>, ApiError> {
        let request = self.request(Method::GET, "/articles/my-articles", Some(token));
        let envelope = self
            .execute::<ArticleList>(request, "Error al cargar tus artículos")
            .await?;
        Ok(envelope.into_data()?.articles)
    }

    /// `POST /articles`: publish a new article and return it as stored.
    pub async fn create_article(
        &self,
        article: &CreateArticleRequest,
        token: &str,
    ) -> Result<Article, ApiError> {
        let request = self
            .request(Method::POST, "/articles", Some(token))
            .json(article);
        let envelope = self
            .execute::<CreatedArticle>(request, "Error al crear el artículo")
            .await?;
        Ok(envelope.into_data()?.article)
    }

    /// `DELETE /articles/{id}`: returns the backend's confirmation message.
    pub async fn delete_article(&self, article_id: u64, token: &str) -> Result<String, ApiError> {
        let request = self.request(
            Method::DELETE,
            &format!("/articles/{article_id}"),
            Some(token),
        );
        let envelope = self
            .execute::<Value>(request, "Error al eliminar el artículo")
            .await?;
        Ok(envelope.message)
    }
}
