//! mockall doubles for the source traits.

use anyhow::Result;
use async_trait::async_trait;
use mockall::mock;

use gaffer::sources::{PlayerSource, SquadSource};
use gaffer::types::{OwnedSquad, Player};

mock! {
    pub Players {}

    #[async_trait]
    impl PlayerSource for Players {
        async fn fetch_players(&self) -> Result<Vec<Player>>;
        fn name(&self) -> &str;
    }
}

mock! {
    pub Squad {}

    #[async_trait]
    impl SquadSource for Squad {
        async fn fetch_squad(&self) -> Result<OwnedSquad>;
        fn name(&self) -> &str;
    }
}
