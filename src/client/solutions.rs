use tracing::info;
use uuid::Uuid;

use crate::{
    ForumClient,
    dispatcher::ApiRequest,
    errors::Error,
    types::{
        CreateSolutionRequest, Solution, UpdateSolutionRequest, VoteRequest, VoteResult, VoteType,
    },
};

impl ForumClient {
    pub async fn create_solution(&self, solution: &CreateSolutionRequest) -> Result<Solution, Error> {
        let request = ApiRequest::post("/solutions").json(solution)?;
        self.context.execute_json(request).await
    }

    pub async fn solution(&self, id: Uuid) -> Result<Solution, Error> {
        self.context
            .execute_json(ApiRequest::get(format!("/solutions/{id}")))
            .await
    }

    pub async fn update_solution(
        &self,
        id: Uuid,
        changes: &UpdateSolutionRequest,
    ) -> Result<Solution, Error> {
        let request = ApiRequest::put(format!("/solutions/{id}")).json(changes)?;
        self.context.execute_json(request).await
    }

    pub async fn delete_solution(&self, id: Uuid) -> Result<(), Error> {
        self.context
            .execute_unit(ApiRequest::delete(format!("/solutions/{id}")))
            .await
    }

    pub async fn problem_solutions(&self, problem_id: Uuid) -> Result<Vec<Solution>, Error> {
        self.context
            .execute_json(ApiRequest::get(format!("/solutions/problem/{problem_id}")))
            .await
    }

    pub async fn user_solutions(&self, user_id: &str) -> Result<Vec<Solution>, Error> {
        let path = format!("/solutions/user/{}", urlencoding::encode(user_id));
        self.context.execute_json(ApiRequest::get(path)).await
    }

    pub async fn my_solutions(&self) -> Result<Vec<Solution>, Error> {
        self.context
            .execute_json(ApiRequest::get("/solutions/my-solutions"))
            .await
    }

    /// Marks the solution as the accepted answer. Only the problem's author may do this.
    pub async fn accept_solution(&self, id: Uuid) -> Result<(), Error> {
        self.context
            .execute_unit(ApiRequest::post(format!("/solutions/{id}/accept")))
            .await?;
        info!("solution accepted: id={}", id);
        Ok(())
    }

    /// Casts a vote and returns the solution's new total. Voting the same way twice removes the vote.
    pub async fn vote(&self, solution_id: Uuid, vote_type: VoteType) -> Result<i64, Error> {
        let request = ApiRequest::post("/solutions/vote").json(&VoteRequest {
            solution_id,
            vote_type,
        })?;
        let result: VoteResult = self.context.execute_json(request).await?;
        Ok(result.vote_count)
    }

    pub async fn remove_vote(&self, solution_id: Uuid) -> Result<(), Error> {
        self.context
            .execute_unit(ApiRequest::delete(format!("/solutions/{solution_id}/vote")))
            .await
    }
}
