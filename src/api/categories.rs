//! Category listing and creation

use crate::auth_client::AuthClient;
use crate::error::Result;
use crate::request::ApiRequest;
use crate::types::{Category, NewCategory};
use crate::validation;
use tracing::info;

impl AuthClient {
    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.execute(ApiRequest::get(["categories"])).await
    }

    /// Category names in server order, for pickers
    pub async fn category_names(&self) -> Result<Vec<String>> {
        Ok(self
            .categories()
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    pub async fn create_category(&self, name: &str) -> Result<Category> {
        validation::validate_category(name)?;

        let request = ApiRequest::post(["category", "create"]).json(&NewCategory {
            name: name.to_string(),
        })?;
        let category: Category = self.execute(request).await?;

        info!(id = category.id, name = %category.name, "Created category");
        Ok(category)
    }
}
