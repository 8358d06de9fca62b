use spongos::{
    ddml::commands::{sizeof, wrap, Commit},
    error::Error as SpongosError,
    Spongos, PRP,
};

use crate::{
    error::Result,
    message::{
        content::{ContentSizeof, ContentWrap},
        hdf::HDF,
        pcf::PCF,
        transport::TransportMessage,
    },
};

/// Header and payload frame of a message, in the clear.
#[derive(Clone, PartialEq, Eq, Hash, Default, Debug)]
pub struct Message<Content> {
    header: HDF,
    payload: PCF<Content>,
}

impl<Content> Message<Content> {
    pub fn new(header: HDF, payload: PCF<Content>) -> Self {
        Self { header, payload }
    }

    pub fn header(&self) -> &HDF {
        &self.header
    }

    pub fn payload(&self) -> &PCF<Content> {
        &self.payload
    }

    pub fn into_parts(self) -> (HDF, PCF<Content>) {
        (self.header, self.payload)
    }

    fn encoded_len(&self) -> Result<usize>
    where
        sizeof::Context: ContentSizeof<HDF> + ContentSizeof<PCF<Content>>,
    {
        let mut ctx = sizeof::Context::new();
        ctx.sizeof(&self.header)?.commit()?.sizeof(&self.payload)?;
        Ok(ctx.finalize())
    }

    /// Encodes header then payload, with a commit in between. Also returns the final sponge
    /// state, which messages linked to this one join.
    pub fn wrap<F>(&mut self) -> Result<(TransportMessage, Spongos<F>)>
    where
        F: PRP + Default,
        for<'b> wrap::Context<&'b mut [u8], F>: ContentWrap<HDF> + ContentWrap<PCF<Content>>,
        sizeof::Context: ContentSizeof<HDF> + ContentSizeof<PCF<Content>>,
    {
        let mut body = vec![0; self.encoded_len()?];
        let spongos = {
            let mut ctx = wrap::Context::<_, F>::new(body.as_mut_slice());
            ctx.wrap(&mut self.header)?.commit()?.wrap(&mut self.payload)?;
            match ctx.stream().len() {
                0 => ctx.finalize(),
                unused => return Err(SpongosError::OutputStreamNotFullyConsumed(unused).into()),
            }
        };
        Ok((TransportMessage::new(body), spongos))
    }
}
