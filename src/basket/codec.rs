//! 篮子表的持久化布局：`HashmapE 8 ^basket`。

use crate::cell::dict::{load_dict, store_dict};
use crate::cell::{Cell, CellBuilder, CellResult, CellSlice};

use super::{BasketError, BasketResult, Basket, DeDustRoute, DexKind, DexRoute, StonFiRoute};

/// 2 位类型标签后跟随该变体的地址。
pub fn encode_route(route: &DexRoute) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder.store_uint(route.kind().tag() as u128, 2)?;
    match route {
        DexRoute::DeDust(DeDustRoute { pool, jetton_vault }) => {
            builder
                .store_address(Some(pool))?
                .store_address(Some(jetton_vault))?;
        }
        DexRoute::StonFi(StonFiRoute {
            router,
            proxy_base,
            router_local_wallet,
        }) => {
            builder
                .store_address(Some(router))?
                .store_address(Some(proxy_base))?
                .store_address(Some(router_local_wallet))?;
        }
    }
    Ok(builder.build())
}

pub fn decode_route(cell: &Cell) -> BasketResult<DexRoute> {
    let mut slice = cell.parse();
    let tag = slice.load_uint(2)? as u8;
    let route = if tag == DexKind::DeDust.tag() {
        DexRoute::DeDust(DeDustRoute {
            pool: slice.load_required_address()?,
            jetton_vault: slice.load_required_address()?,
        })
    } else if tag == DexKind::StonFi.tag() {
        DexRoute::StonFi(StonFiRoute {
            router: slice.load_required_address()?,
            proxy_base: slice.load_required_address()?,
            router_local_wallet: slice.load_required_address()?,
        })
    } else {
        return Err(BasketError::UnknownDexTag(tag));
    };
    Ok(route)
}

pub fn encode_basket(basket: &Basket) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder
        .store_coins(basket.weight)?
        .store_address(Some(&basket.wallet))?
        .store_ref(encode_route(&basket.route)?)?
        .store_address(Some(&basket.master))?;
    Ok(builder.build())
}

pub fn decode_basket(cell: &Cell) -> BasketResult<Basket> {
    let mut slice = cell.parse();
    let weight = slice.load_coins()?;
    let wallet = slice.load_required_address()?;
    let route = decode_route(&slice.load_ref()?)?;
    let master = slice.load_required_address()?;
    Ok(Basket {
        weight,
        wallet,
        master,
        route,
    })
}

pub fn store_baskets(builder: &mut CellBuilder, baskets: &[Basket]) -> CellResult<()> {
    let mut entries = Vec::with_capacity(baskets.len());
    for (index, basket) in baskets.iter().enumerate() {
        let mut value = CellBuilder::new();
        value.store_ref(encode_basket(basket)?)?;
        entries.push((index as u8, value));
    }
    store_dict(builder, entries)
}

/// 读取篮子表并校验声明数量与连续键。
pub fn load_baskets(slice: &mut CellSlice, declared: usize) -> BasketResult<Vec<Basket>> {
    let entries = load_dict::<u8>(slice)?;
    if entries.len() != declared {
        return Err(BasketError::CountMismatch {
            declared,
            actual: entries.len(),
        });
    }
    let mut baskets = Vec::with_capacity(entries.len());
    for (position, (key, mut value)) in entries.into_iter().enumerate() {
        if key as usize != position {
            return Err(BasketError::SparseKeys { key, len: declared });
        }
        baskets.push(decode_basket(&value.load_ref()?)?);
    }
    Ok(baskets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basket::fixtures::{dedust_basket, stonfi_basket};

    #[test]
    fn dedust_route_carries_two_addresses() {
        let basket = dedust_basket(3, 500_000_000);
        let cell = encode_route(&basket.route).unwrap();
        assert_eq!(cell.bit_len(), 2 + 2 * 267);
        assert_eq!(decode_route(&cell).unwrap(), basket.route);
    }

    #[test]
    fn stonfi_route_carries_three_addresses() {
        let basket = stonfi_basket(3, 500_000_000);
        let cell = encode_route(&basket.route).unwrap();
        assert_eq!(cell.bit_len(), 2 + 3 * 267);
        assert_eq!(decode_basket(&encode_basket(&basket).unwrap()).unwrap(), basket);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut builder = CellBuilder::new();
        builder.store_uint(2, 2).unwrap();
        assert_eq!(
            decode_route(&builder.build()).unwrap_err(),
            BasketError::UnknownDexTag(2)
        );
    }

    #[test]
    fn basket_table_checks_declared_count() {
        let baskets = vec![dedust_basket(1, 1), dedust_basket(2, 2), dedust_basket(3, 3)];
        let mut builder = CellBuilder::new();
        store_baskets(&mut builder, &baskets).unwrap();
        let cell = builder.build();

        assert_eq!(load_baskets(&mut cell.parse(), 3).unwrap(), baskets);
        assert_eq!(
            load_baskets(&mut cell.parse(), 2).unwrap_err(),
            BasketError::CountMismatch {
                declared: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn basket_table_rejects_gaps() {
        let mut entries = Vec::new();
        for key in [0u8, 2u8] {
            let mut value = CellBuilder::new();
            value
                .store_ref(encode_basket(&dedust_basket(key, 1)).unwrap())
                .unwrap();
            entries.push((key, value));
        }
        let mut builder = CellBuilder::new();
        store_dict(&mut builder, entries).unwrap();
        let cell = builder.build();
        assert_eq!(
            load_baskets(&mut cell.parse(), 2).unwrap_err(),
            BasketError::SparseKeys { key: 2, len: 2 }
        );
    }
}
