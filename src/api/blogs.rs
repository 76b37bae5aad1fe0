//! Blog listing, search and authoring

use crate::auth_client::AuthClient;
use crate::error::Result;
use crate::request::ApiRequest;
use crate::types::{Blog, BlogSearch, BlogUpdate, CreatedBlog, NewBlog};
use crate::validation;
use tracing::{debug, info};

impl AuthClient {
    pub async fn all_blogs(&self) -> Result<Vec<Blog>> {
        self.execute(ApiRequest::get(["blogs", "all"])).await
    }

    pub async fn blog(&self, id: i64) -> Result<Blog> {
        self.execute(ApiRequest::get(["blogs".to_string(), id.to_string()]))
            .await
    }

    /// Blogs written by the logged-in user
    pub async fn my_blogs(&self) -> Result<Vec<Blog>> {
        self.execute(ApiRequest::get(["user", "getall"])).await
    }

    pub async fn blogs_by_category(&self, category: &str) -> Result<Vec<Blog>> {
        self.execute(ApiRequest::get(["blogs", "info", category])).await
    }

    /// Filter blogs by category and, when both bounds are given, by date range
    ///
    /// An empty category lists every blog. A half-open range is ignored.
    pub async fn search_blogs(
        &self,
        category: &str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<BlogSearch> {
        let category = category.trim();
        if category.is_empty() {
            return self.all_blogs().await.map(BlogSearch::Blogs);
        }

        let range = match (from.filter(|f| !f.is_empty()), to.filter(|t| !t.is_empty())) {
            (Some(from), Some(to)) => Some((from, to)),
            _ => None,
        };

        match range {
            Some((from, to)) => {
                debug!(category = %category, from = %from, to = %to, "Searching blogs by date range");
                self.execute(ApiRequest::get(["blogs", "get", category, from, to]))
                    .await
                    .map(BlogSearch::Summary)
            }
            None => self
                .blogs_by_category(category)
                .await
                .map(BlogSearch::Blogs),
        }
    }

    pub async fn create_blog(&self, title: &str, category: &str, article: &str) -> Result<CreatedBlog> {
        validation::validate_blog(title, category, article)?;

        let request = ApiRequest::post(["user", "blogs", "add", title]).json(&NewBlog {
            category: category.to_string(),
            article: article.to_string(),
        })?;
        let created: CreatedBlog = self.execute(request).await?;

        info!(id = created.id, title = %title, "Created blog");
        Ok(created)
    }

    pub async fn update_blog(&self, id: i64, title: &str, category: &str, article: &str) -> Result<Blog> {
        validation::validate_blog(title, category, article)?;

        let request = ApiRequest::put([
            "user".to_string(),
            "blogs".to_string(),
            "update".to_string(),
            id.to_string(),
        ])
        .json(&BlogUpdate {
            blog_name: title.to_string(),
            category: category.to_string(),
            article: article.to_string(),
        })?;
        let updated: Blog = self.execute(request).await?;

        info!(id = updated.id, "Updated blog");
        Ok(updated)
    }

    /// Delete a blog by its title
    pub async fn delete_blog(&self, blog_name: &str) -> Result<()> {
        self.execute_empty(ApiRequest::delete(["user", "delete", blog_name]))
            .await?;
        info!(title = %blog_name, "Deleted blog");
        Ok(())
    }
}
