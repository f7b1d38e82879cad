//! Cross-server consensus scenarios, driven through the public channel API.

#[cfg(test)]
mod e2e_consensus;

#[cfg(test)]
mod flows;
