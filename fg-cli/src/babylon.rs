use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use fg_resolver::{BabylonQuery, ResolverError};
use fg_types::{FpPubKey, PowerMap};

#[derive(Deserialize)]
struct FinalityProvidersResponse {
    finality_providers: Vec<FinalityProviderEntry>,
}

#[derive(Deserialize)]
struct FinalityProviderEntry {
    btc_pk_hex: String,
}

#[derive(Deserialize)]
struct VotingPowerResponse {
    voting_power: String,
}

#[derive(Deserialize)]
struct EarliestDelegationResponse {
    height: u32,
}

/// Babylon control-chain LCD client (consulted by C8), following the same
/// GET-and-decode shape as `CosmWasmController`'s REST queries.
pub struct BabylonHttpQuery {
    http: Client,
    rest_url: Url,
}

impl BabylonHttpQuery {
    pub fn new(rest_url: Url) -> Self {
        Self {
            http: Client::new(),
            rest_url,
        }
    }

    fn err(e: impl std::fmt::Display) -> ResolverError {
        ResolverError::BabylonQuery(e.to_string())
    }
}

#[async_trait]
impl BabylonQuery for BabylonHttpQuery {
    async fn query_all_fp_btc_pubkeys(&self, consumer_id: &str) -> Result<Vec<FpPubKey>, ResolverError> {
        let url = self
            .rest_url
            .join("babylon/btcstaking/v1/finality_providers")
            .map_err(Self::err)?;

        let response: FinalityProvidersResponse = self
            .http
            .get(url)
            .query(&[("consumer_id", consumer_id)])
            .send()
            .await
            .map_err(Self::err)?
            .json()
            .await
            .map_err(Self::err)?;

        response
            .finality_providers
            .into_iter()
            .map(|fp| FpPubKey::from_hex(&fp.btc_pk_hex).map_err(Self::err))
            .collect()
    }

    async fn multi_fp_power(&self, fp_pks: &[FpPubKey], btc_height: u32) -> Result<PowerMap, ResolverError> {
        let mut powers = PowerMap::new();
        for pk in fp_pks {
            let url = self
                .rest_url
                .join(&format!(
                    "babylon/finality/v1/voting_power/{}/height/{btc_height}",
                    pk.to_hex()
                ))
                .map_err(Self::err)?;

            let response: VotingPowerResponse =
                self.http.get(url).send().await.map_err(Self::err)?.json().await.map_err(Self::err)?;

            let power: u64 = response.voting_power.parse().map_err(Self::err)?;
            powers.insert(*pk, power);
        }
        Ok(powers)
    }

    async fn earliest_active_delegation_btc_height(&self, fp_pks: &[FpPubKey]) -> Result<u32, ResolverError> {
        let joined: Vec<String> = fp_pks.iter().map(FpPubKey::to_hex).collect();
        let url = self
            .rest_url
            .join("babylon/btcstaking/v1/finality_providers/earliest_delegation_height")
            .map_err(Self::err)?;

        let response: EarliestDelegationResponse = self
            .http
            .get(url)
            .query(&[("btc_pks", joined.join(","))])
            .send()
            .await
            .map_err(Self::err)?
            .json()
            .await
            .map_err(Self::err)?;

        Ok(response.height)
    }
}
