use uuid::Uuid;

use crate::{
    ForumClient,
    dispatcher::ApiRequest,
    errors::Error,
    types::{
        CreateProblemRequest, PaginatedResult, Problem, ProblemDetail, ProblemFilter,
        UpdateProblemRequest,
    },
};

impl ForumClient {
    pub async fn list_problems(&self, filter: &ProblemFilter) -> Result<PaginatedResult<Problem>, Error> {
        let mut request = ApiRequest::get("/problems");
        for (key, value) in filter.to_query() {
            request = request.query(key, value);
        }
        self.context.execute_json(request).await
    }

    pub async fn problem(&self, id: Uuid) -> Result<ProblemDetail, Error> {
        self.context
            .execute_json(ApiRequest::get(format!("/problems/{id}")))
            .await
    }

    pub async fn create_problem(&self, problem: &CreateProblemRequest) -> Result<Problem, Error> {
        let request = ApiRequest::post("/problems").json(problem)?;
        self.context.execute_json(request).await
    }

    pub async fn update_problem(&self, id: Uuid, changes: &UpdateProblemRequest) -> Result<Problem, Error> {
        let request = ApiRequest::put(format!("/problems/{id}")).json(changes)?;
        self.context.execute_json(request).await
    }

    pub async fn delete_problem(&self, id: Uuid) -> Result<(), Error> {
        self.context
            .execute_unit(ApiRequest::delete(format!("/problems/{id}")))
            .await
    }

    pub async fn my_problems(&self) -> Result<Vec<Problem>, Error> {
        self.context
            .execute_json(ApiRequest::get("/problems/my-problems"))
            .await
    }

    pub async fn user_problems(&self, user_id: &str) -> Result<Vec<Problem>, Error> {
        let path = format!("/problems/user/{}", urlencoding::encode(user_id));
        self.context.execute_json(ApiRequest::get(path)).await
    }
}
