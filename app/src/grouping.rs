use crate::cnpj::{Cnpj, CnpjError, Region};
use serde::Serialize;
use std::collections::BTreeMap;

/// Agrupamento de CNPJs por região. Dentro de cada grupo a ordem de entrada é mantida.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegionGroups(BTreeMap<Region, Vec<Cnpj>>);

impl RegionGroups {
    pub fn iter(&self) -> impl Iterator<Item = (Region, &[Cnpj])> {
        self.0.iter().map(|(region, cnpjs)| (*region, cnpjs.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Total de CNPJs somando todos os grupos.
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

impl FromIterator<Cnpj> for RegionGroups {
    fn from_iter<I: IntoIterator<Item = Cnpj>>(iter: I) -> Self {
        let mut groups: BTreeMap<Region, Vec<Cnpj>> = BTreeMap::new();
        for cnpj in iter {
            groups.entry(cnpj.region()).or_default().push(cnpj);
        }
        Self(groups)
    }
}

pub fn group_by_region(cnpjs: &[Cnpj]) -> RegionGroups {
    cnpjs.iter().copied().collect()
}

/// Converte o lote inteiro antes de agrupar: um único elemento fora do
/// intervalo rejeita o lote todo.
pub fn parse_batch(values: &[i64]) -> Result<Vec<Cnpj>, CnpjError> {
    values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            Cnpj::new(value).map_err(|_| CnpjError::BatchElementOutOfRange { index, value })
        })
        .collect()
}

pub fn group_batch(values: &[i64]) -> Result<RegionGroups, CnpjError> {
    Ok(group_by_region(&parse_batch(values)?))
}
