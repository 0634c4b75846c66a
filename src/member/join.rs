//! Join-request creation.

use crate::error::{EpidError, Result};
use crate::transcript::join_challenge;
use crate::types::{GroupPubKey, IssuerNonce, JoinRequest};

use super::MemberContext;

const LOG_TARGET: &str = "epid_member::member::join";

impl MemberContext<'_> {
    /// Produces a join request `(F, c, s)` proving knowledge of the member
    /// secret under the issuer's nonce, and writes its 128-byte wire form
    /// into `out`.
    ///
    /// The request is built against the group being joined, which need not
    /// be the provisioned group; the active credential is left untouched.
    pub fn create_join_request(
        &mut self,
        pub_key: &GroupPubKey,
        ni: &IssuerNonce,
        out: &mut [u8],
    ) -> Result<()> {
        let alg = pub_key.gid.hash_alg()?;
        if out.len() < JoinRequest::SIZE {
            return Err(EpidError::NoMem);
        }

        let commit = self.custodian.join_commit(&pub_key.h1)?;
        let c = join_challenge(pub_key, &commit.f, &commit.r, ni, alg);
        let s = match self.custodian.join_response(c) {
            Ok(s) => s,
            Err(e) => {
                self.custodian.reset();
                return Err(e);
            }
        };

        let request = JoinRequest {
            f: commit.f,
            c,
            s,
        };
        out[..JoinRequest::SIZE].copy_from_slice(&request.to_bytes());
        tracing::debug!(target: LOG_TARGET, "join request created");
        Ok(())
    }
}
